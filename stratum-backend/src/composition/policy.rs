/// What a tiered read does with a value found only in the remote tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefillPolicy {
    /// Copy the value into the local tier so the next read is served locally.
    #[default]
    Always,
    /// Leave the local tier untouched.
    Never,
}

impl RefillPolicy {
    /// Returns `true` if a remote hit should be copied into the local tier.
    pub fn should_refill(&self) -> bool {
        matches!(self, RefillPolicy::Always)
    }
}
