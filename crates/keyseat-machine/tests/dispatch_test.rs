use keyseat_core::{Error, GeometryError, ParameterField, ValidationError};
use keyseat_machine::{
    dispatch::parse_words, CommandBlock, CommandHandler, CommandRegistry, CommandStatus,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[test]
fn test_parse_words_basic() {
    let words = parse_words("M800 D2 Q10 S2 P0.1 R2 L1 H1").unwrap();
    assert_eq!(words.len(), 8);
    assert_eq!(words[0], ('M', 800.0));
    assert_eq!(words[4], ('P', 0.1));
}

#[test]
fn test_parse_words_signed_and_lowercase() {
    let words = parse_words("g0 x-10.5 z+2").unwrap();
    assert_eq!(words, vec![('G', 0.0), ('X', -10.5), ('Z', 2.0)]);
}

#[test]
fn test_parse_words_strips_comments() {
    let words = parse_words("M800 D2 ; full cycle").unwrap();
    assert_eq!(words, vec![('M', 800.0), ('D', 2.0)]);

    let words = parse_words("(initial) M800 D2 (depth)").unwrap();
    assert_eq!(words, vec![('M', 800.0), ('D', 2.0)]);

    assert!(parse_words("; just a comment").unwrap().is_empty());
    assert!(parse_words("").unwrap().is_empty());
}

#[test]
fn test_parse_words_rejects_garbage() {
    assert!(parse_words("M800 D").is_err());
    assert!(parse_words("M800 D2 #5").is_err());
    assert!(parse_words("M800 D2.0.1").is_err());
}

#[test]
fn test_command_block_extraction() {
    let block = CommandBlock::parse("M800 D2 Q10 H0").unwrap().unwrap();
    assert_eq!(block.mcode, 800);
    assert_eq!(block.word('D'), Some(2.0));
    assert_eq!(block.word('q'), Some(10.0));
    assert_eq!(block.word('H'), Some(0.0));
    assert!(block.has_word('Q'));
    assert!(!block.has_word('S'));
    // the M word itself is not an argument
    assert_eq!(block.word('M'), None);
}

#[test]
fn test_command_block_requires_m_word() {
    assert!(CommandBlock::parse("G0 X10 Z10").unwrap().is_none());
    assert!(CommandBlock::parse("").unwrap().is_none());
    assert!(CommandBlock::parse("M800.5 D2").is_err());
}

struct CountingHandler {
    mcode: u16,
    executed: Arc<AtomicU32>,
}

impl CommandHandler for CountingHandler {
    fn accepts(&self, mcode: u16) -> bool {
        mcode == self.mcode
    }

    fn validate(&self, _block: &CommandBlock) -> keyseat_core::Result<()> {
        Ok(())
    }

    fn execute(&self, _block: &CommandBlock) -> keyseat_core::Result<()> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_registry_order_and_unregister() {
    let first = Arc::new(AtomicU32::new(0));
    let second = Arc::new(AtomicU32::new(0));

    let mut registry = CommandRegistry::new();
    let first_handle = registry.register(Box::new(CountingHandler {
        mcode: 900,
        executed: first.clone(),
    }));
    registry.register(Box::new(CountingHandler {
        mcode: 900,
        executed: second.clone(),
    }));

    assert_eq!(registry.dispatch_line("M900"), CommandStatus::Ok);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);

    assert!(registry.unregister(&first_handle));
    assert!(!registry.unregister(&first_handle));

    assert_eq!(registry.dispatch_line("M900"), CommandStatus::Ok);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn test_registry_reports_unhandled() {
    let registry = CommandRegistry::new();
    assert_eq!(registry.dispatch_line("M900"), CommandStatus::Unhandled);
    assert_eq!(registry.dispatch_line("G0 X1"), CommandStatus::Unhandled);
    // unparseable lines are delegated upstream, not failed here
    assert_eq!(registry.dispatch_line("M900 D"), CommandStatus::Unhandled);
}

#[test]
fn test_status_mapping_from_errors() {
    let err: Error = ValidationError::Missing {
        field: ParameterField::Depth,
    }
    .into();
    assert_eq!(
        CommandStatus::from_error(&err),
        CommandStatus::InvalidArgument(ParameterField::Depth)
    );

    let err: Error = GeometryError::ToolWiderThanBore {
        half_width: 11.0,
        bore_radius: 10.0,
    }
    .into();
    assert_eq!(
        CommandStatus::from_error(&err),
        CommandStatus::GeometryInfeasible
    );

    assert!(!CommandStatus::Unhandled.is_ok());
    assert_eq!(CommandStatus::Ok.to_string(), "ok");
    assert_eq!(
        CommandStatus::InvalidArgument(ParameterField::Step).to_string(),
        "invalid argument: step"
    );
}
