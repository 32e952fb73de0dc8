use bitcoin::blockdata::opcodes::all::{OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4};

use crate::chain::Script;

/// One step of a locking script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A non-push opcode, as its raw byte.
    Opcode(u8),
    /// Pushed bytes. `OP_0` yields an empty push.
    PushData(&'a [u8]),
    End,
    /// Truncated length prefix or a push running past the end of the script.
    Malformed,
}

/// Reads tokens off an immutable script.
///
/// Once `Malformed` has been produced, every following read yields `End`.
#[derive(Clone)]
pub struct ScriptCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ScriptCursor<'a> {
    pub fn new(script: &'a Script) -> Self {
        ScriptCursor::from_bytes(script.as_bytes())
    }

    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        ScriptCursor { bytes, pos: 0 }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        let opcode = match self.bytes.get(self.pos) {
            Some(opcode) => *opcode,
            None => return Token::End,
        };
        self.pos += 1;

        let len = if opcode < OP_PUSHDATA1.into_u8() {
            Some(opcode as usize)
        } else if opcode == OP_PUSHDATA1.into_u8() {
            self.read_len(1)
        } else if opcode == OP_PUSHDATA2.into_u8() {
            self.read_len(2)
        } else if opcode == OP_PUSHDATA4.into_u8() {
            self.read_len(4)
        } else {
            return Token::Opcode(opcode);
        };

        match len.and_then(|len| self.take(len)) {
            Some(data) => Token::PushData(data),
            None => {
                trace!("malformed push at offset {}", self.pos);
                self.pos = self.bytes.len();
                Token::Malformed
            }
        }
    }

    /// Script bytes not consumed yet.
    pub fn remaining(&self) -> Script {
        Script::from(self.bytes[self.pos..].to_vec())
    }

    fn read_len(&mut self, width: usize) -> Option<usize> {
        let prefix = self.take(width)?;
        Some(
            prefix
                .iter()
                .rev()
                .fold(0usize, |acc, b| (acc << 8) | *b as usize),
        )
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let data = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(data)
    }
}
