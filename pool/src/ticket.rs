use std::fmt::Display;

/// Identifier of a single ticket. Minted in increasing order starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TicketId(pub u64);

impl TicketId {
    pub const FIRST: TicketId = TicketId(1);

    /// Identifier `n` places after this one.
    pub fn advance(self, n: usize) -> TicketId {
        TicketId(self.0 + n as u64)
    }
}

impl Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
