//! Channel name derivation
//!
//! Channels are declared by display name but looked up by their URL name.
//! The platform name is the display name lowercased with spaces replaced by
//! hyphens, which is also how provisioning names the channels it creates.

/// Derive the platform channel name from a display name.
///
/// `"Monday Races"` becomes `"monday-races"`.
#[must_use]
pub fn channel_name(display_name: &str) -> String {
    display_name.to_lowercase().replace(' ', "-")
}
