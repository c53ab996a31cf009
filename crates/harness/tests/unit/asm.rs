//! Assembler Unit Tests.
//!
//! Verifies the encodings of each instruction format, label and offset
//! resolution, and that every malformed line is reported with its line
//! number.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rvdiff_core::asm::{Assembler, Rv32Assembler, parse_immediate};
use rvdiff_core::common::AsmError;

fn encode_one(line: &str) -> u32 {
    let image = Rv32Assembler::new(0).assemble(line).unwrap();
    image.read_word(0).unwrap()
}

fn assemble_err(program: &str) -> AsmError {
    Rv32Assembler::new(0x200).assemble(program).unwrap_err()
}

#[rstest]
#[case("addi x1, x0, 1", 0x0010_0093)]
#[case("lui x1, 0x42", 0x0004_20B7)]
#[case("add x3, x1, x2", 0x0020_81B3)]
#[case("mul x3, x1, x2", 0x0220_81B3)]
#[case("sw x2, 4(x1)", 0x0020_A223)]
#[case("srai x1, x1, 3", 0x4030_D093)]
#[case("beq x0, x0, 8", 0x0000_0463)]
#[case("jal x1, 8", 0x0080_00EF)]
#[case("ecall", 0x0000_0073)]
#[case("nop", 0x0000_0013)]
#[case("addi ra, zero, 1", 0x0010_0093)]
fn encodes(#[case] line: &str, #[case] expected: u32) {
    assert_eq!(encode_one(line), expected, "{line}");
}

#[test]
fn places_text_at_base() {
    let image = Rv32Assembler::new(0x200).assemble("nop\nnop").unwrap();
    assert_eq!(image.entry(), 0x200);
    assert_eq!(image.sections().len(), 1);
    assert_eq!(image.sections()[0].addr, 0x200);
    assert_eq!(image.byte_len(), 8);
    assert_eq!(image.read_word(0x204), Some(0x0000_0013));
}

#[test]
fn skips_comments_and_blank_lines() {
    let image = Rv32Assembler::new(0)
        .assemble("# header\n\n  nop  # trailing\n")
        .unwrap();
    assert_eq!(image.byte_len(), 4);
}

#[test]
fn resolves_labels_backwards_and_forwards() {
    let program = "start:\n  beq x0, x0, end\n  nop\nend: jal x0, start";
    let image = Rv32Assembler::new(0).assemble(program).unwrap();
    // beq at 0 jumps +8, jal at 8 jumps -8.
    assert_eq!(image.read_word(0), Some(0x0000_0463));
    assert_eq!(image.read_word(8), Some(encode_one("jal x0, -8")));
}

#[test]
fn empty_program_has_no_sections() {
    let image = Rv32Assembler::new(0x200).assemble("# nothing\n").unwrap();
    assert!(image.sections().is_empty());
}

#[test]
fn unknown_mnemonic() {
    assert_eq!(
        assemble_err("nop\nfrob x1"),
        AsmError::UnknownMnemonic {
            line: 2,
            mnemonic: "frob".to_string()
        }
    );
}

#[test]
fn operand_count() {
    assert_eq!(
        assemble_err("add x1, x2"),
        AsmError::OperandCount {
            line: 1,
            mnemonic: "add".to_string(),
            expected: 3,
            found: 2
        }
    );
}

#[test]
fn invalid_register() {
    assert_eq!(
        assemble_err("addi x32, x0, 1"),
        AsmError::InvalidRegister {
            line: 1,
            token: "x32".to_string()
        }
    );
}

#[rstest]
#[case("addi x1, x0, 2048", 2048)]
#[case("addi x1, x0, -2049", -2049)]
#[case("slli x1, x1, 32", 32)]
#[case("lui x1, 0x100000", 0x10_0000)]
#[case("beq x0, x0, 3", 3)]
fn immediate_out_of_range(#[case] line: &str, #[case] value: i64) {
    match assemble_err(line) {
        AsmError::ImmediateRange { line: 1, value: v, .. } => assert_eq!(v, value),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn malformed_memory_operand() {
    assert_eq!(
        assemble_err("lw x1, x2"),
        AsmError::MemoryOperand {
            line: 1,
            token: "x2".to_string()
        }
    );
}

#[test]
fn undefined_label() {
    assert_eq!(
        assemble_err("bne x1, x2, nowhere"),
        AsmError::UndefinedLabel {
            line: 1,
            label: "nowhere".to_string()
        }
    );
}

#[test]
fn duplicate_label() {
    assert_eq!(
        assemble_err("a: nop\na: nop"),
        AsmError::DuplicateLabel {
            line: 2,
            label: "a".to_string()
        }
    );
}

#[rstest]
#[case("42", Some(42))]
#[case("-7", Some(-7))]
#[case("0x1F", Some(31))]
#[case("-0x10", Some(-16))]
#[case("0b101", Some(5))]
#[case("x1", None)]
#[case("", None)]
#[case("12abc", None)]
fn immediates(#[case] token: &str, #[case] expected: Option<i64>) {
    assert_eq!(parse_immediate(token), expected);
}
