//! Utility functions for channel implementations

/// Check if a sender is allowed by a channel's `allowFrom` list.
///
/// An empty list or a `"*"` entry allows everyone. Otherwise the sender must
/// match an entry after normalization.
pub fn check_allowed_sender(sender: &str, allow_list: &[String]) -> bool {
    if allow_list.is_empty() || allow_list.iter().any(|a| a == "*") {
        return true;
    }

    let normalized_sender = normalize_sender_id(sender);
    allow_list
        .iter()
        .any(|allowed| normalized_sender == normalize_sender_id(allowed))
}

/// Normalize a sender ID: trim whitespace and strip control characters.
pub fn normalize_sender_id(sender: &str) -> String {
    sender.trim().chars().filter(|c| !c.is_control()).collect()
}

#[cfg(test)]
mod tests;
