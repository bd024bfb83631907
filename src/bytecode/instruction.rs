//! Bytecode instruction definitions for the Bnuuy VM.

/// Opcodes for the bytecode virtual machine.
///
/// Every opcode is one byte. Opcodes with an operand are followed by exactly
/// one operand byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // ============ Arithmetic ============
    /// Add two numbers: a + b
    Add = 0,
    /// Subtract two numbers: a - b
    Subtract = 1,
    /// Divide two numbers: a / b
    Divide = 2,
    /// Multiply two numbers: a * b
    Multiply = 3,
    /// Negate a number: -a
    Negate = 4,

    // ============ Line information ============
    /// Set the current line: UPDATE_LINE <line:u8>
    UpdateLine = 5,

    // ============ Constants ============
    /// Load a constant from the constant pool: CONSTANT <index:u8>
    Constant = 6,

    // ============ Control ============
    /// Pop the result and stop
    Return = 7,
}

impl OpCode {
    /// Get the number of operand bytes for this opcode.
    pub fn operand_size(self) -> usize {
        match self {
            OpCode::Add
            | OpCode::Subtract
            | OpCode::Divide
            | OpCode::Multiply
            | OpCode::Negate
            | OpCode::Return => 0,

            OpCode::UpdateLine | OpCode::Constant => 1,
        }
    }

    /// Convert from u8 to OpCode.
    pub fn from_u8(byte: u8) -> Option<OpCode> {
        match byte {
            0 => Some(OpCode::Add),
            1 => Some(OpCode::Subtract),
            2 => Some(OpCode::Divide),
            3 => Some(OpCode::Multiply),
            4 => Some(OpCode::Negate),
            5 => Some(OpCode::UpdateLine),
            6 => Some(OpCode::Constant),
            7 => Some(OpCode::Return),
            _ => None,
        }
    }

    /// The mnemonic printed by the disassembler.
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Negate => "OP_NEGATE",
            OpCode::UpdateLine => "OP_UPDATE_LINE",
            OpCode::Constant => "OP_CONSTANT",
            OpCode::Return => "OP_RETURN",
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::from_u8(byte).ok_or(byte)
    }
}

/// A decoded instruction: an opcode together with its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Add,
    Subtract,
    Divide,
    Multiply,
    Negate,
    UpdateLine { line: u8 },
    Constant { index: u8 },
    Return,
    /// A byte that is not a known opcode.
    Unknown(u8),
    /// An opcode whose operand byte lies past the end of the code.
    Truncated(OpCode),
}

impl Instruction {
    /// Decode the instruction starting at `offset`, or `None` past the end.
    pub fn decode(code: &[u8], offset: usize) -> Option<Instruction> {
        let byte = *code.get(offset)?;
        let Some(op) = OpCode::from_u8(byte) else {
            return Some(Instruction::Unknown(byte));
        };
        let operand = || code.get(offset + 1).copied();
        let instruction = match op {
            OpCode::Add => Instruction::Add,
            OpCode::Subtract => Instruction::Subtract,
            OpCode::Divide => Instruction::Divide,
            OpCode::Multiply => Instruction::Multiply,
            OpCode::Negate => Instruction::Negate,
            OpCode::Return => Instruction::Return,
            OpCode::UpdateLine => match operand() {
                Some(line) => Instruction::UpdateLine { line },
                None => Instruction::Truncated(op),
            },
            OpCode::Constant => match operand() {
                Some(index) => Instruction::Constant { index },
                None => Instruction::Truncated(op),
            },
        };
        Some(instruction)
    }

    /// Number of bytes this instruction occupies in the code.
    pub fn size(&self) -> usize {
        match self {
            Instruction::UpdateLine { .. } | Instruction::Constant { .. } => 2,
            _ => 1,
        }
    }

    pub fn opcode(&self) -> Option<OpCode> {
        match self {
            Instruction::Add => Some(OpCode::Add),
            Instruction::Subtract => Some(OpCode::Subtract),
            Instruction::Divide => Some(OpCode::Divide),
            Instruction::Multiply => Some(OpCode::Multiply),
            Instruction::Negate => Some(OpCode::Negate),
            Instruction::UpdateLine { .. } => Some(OpCode::UpdateLine),
            Instruction::Constant { .. } => Some(OpCode::Constant),
            Instruction::Return => Some(OpCode::Return),
            Instruction::Truncated(op) => Some(*op),
            Instruction::Unknown(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_roundtrip() {
        for i in 0..=OpCode::Return as u8 {
            let op = OpCode::from_u8(i).expect("valid opcode");
            assert_eq!(i, u8::from(op));
        }
    }

    #[test]
    fn test_invalid_opcode() {
        assert!(OpCode::from_u8(8).is_none());
        assert_eq!(OpCode::try_from(255), Err(255));
    }

    #[test]
    fn test_operand_sizes() {
        assert_eq!(OpCode::Constant.operand_size(), 1);
        assert_eq!(OpCode::UpdateLine.operand_size(), 1);
        assert_eq!(OpCode::Negate.operand_size(), 0);
        assert_eq!(OpCode::Return.operand_size(), 0);
    }

    #[test]
    fn test_decode_with_operands() {
        let code = [6, 3, 5, 12, 4, 7];
        assert_eq!(
            Instruction::decode(&code, 0),
            Some(Instruction::Constant { index: 3 })
        );
        assert_eq!(
            Instruction::decode(&code, 2),
            Some(Instruction::UpdateLine { line: 12 })
        );
        assert_eq!(Instruction::decode(&code, 4), Some(Instruction::Negate));
        assert_eq!(Instruction::decode(&code, 5), Some(Instruction::Return));
        assert_eq!(Instruction::decode(&code, 6), None);
    }

    #[test]
    fn test_decode_length_matches_operand_size() {
        for byte in 0..=OpCode::Return as u8 {
            let op = OpCode::from_u8(byte).unwrap();
            let code = [byte, 0];
            let decoded = Instruction::decode(&code, 0).unwrap();
            assert_eq!(decoded.size(), 1 + op.operand_size());
            assert_eq!(decoded.opcode(), Some(op));
        }
    }

    #[test]
    fn test_decode_malformed() {
        assert_eq!(Instruction::decode(&[200], 0), Some(Instruction::Unknown(200)));
        assert_eq!(
            Instruction::decode(&[6], 0),
            Some(Instruction::Truncated(OpCode::Constant))
        );
    }
}
