//! Mutating-operation log for [`super::SimFlash`].

/// The two kinds of mutating flash operation.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TransactionKind {
    Write,
    Erase,
}

/// One recorded `write` or `erase_sector` call.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub addr: u32,
    pub len: u32,
}
