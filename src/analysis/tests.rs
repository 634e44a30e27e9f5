use crate::analysis::{BlockKind, Cfg, StackFrame, Statement};

fn anchored() -> Cfg {
    let mut cfg = Cfg::new();
    cfg.set_entry(0x000100);
    cfg
}

#[test]
fn ensure_block_is_idempotent() {
    let mut cfg = Cfg::new();

    cfg.ensure_block(0x2000).mark_branch_target();
    cfg.ensure_block(0x2000);

    assert_eq!(1, cfg.block_count());
    assert_eq!(BlockKind::Branch, cfg.block(0x2000).unwrap().kind());
}

#[test]
fn branch_records_goto_and_moves_current() {
    let mut cfg = anchored();

    cfg.record_branch(0x000110, 0x000200);

    let entry = cfg.block(0x000100).unwrap();
    assert_eq!(&[0x000110], entry.instructions());
    assert_eq!(&[0x000200], entry.successors());

    let target = cfg.block(0x000200).unwrap();
    assert_eq!(BlockKind::Branch, target.kind());
    assert_eq!("label_000200", target.name());

    assert_eq!(Some(0x000200), cfg.current());
    assert_eq!(
        Statement::Goto(0x000200),
        cfg.instruction(0x000110).unwrap().statement()
    );
}

#[test]
fn revisited_branch_does_not_duplicate() {
    let mut cfg = anchored();

    cfg.record_branch(0x000110, 0x000200);
    cfg.record_branch(0x000210, 0x000100);
    cfg.record_branch(0x000110, 0x000200);

    let entry = cfg.block(0x000100).unwrap();
    assert_eq!(&[0x000110], entry.instructions());
    assert_eq!(&[0x000200], entry.successors());
    assert_eq!(Some(0x000200), cfg.current());
}

#[test]
fn call_then_return_restores_caller_continuation() {
    let mut cfg = anchored();

    cfg.record_call(0x000104, 0x001234);
    cfg.push_frame(StackFrame::enter(0x00, 0x1234));
    assert_eq!(1, cfg.depth());

    cfg.record_return(0x00123A, 0x000108);

    let callee = cfg.block(0x001234).unwrap();
    assert_eq!(BlockKind::Function, callee.kind());
    assert_eq!(
        Statement::Call(0x001234),
        cfg.instruction(0x000104).unwrap().statement()
    );
    assert_eq!(
        Statement::Return,
        cfg.instruction(0x00123A).unwrap().statement()
    );
    assert_eq!(Some(0x000108), cfg.current());
    assert_eq!(0, cfg.depth());
}

#[test]
fn function_kind_takes_precedence_permanently() {
    let mut cfg = anchored();

    cfg.record_branch(0x000110, 0x000300);
    assert_eq!(BlockKind::Branch, cfg.block(0x000300).unwrap().kind());

    cfg.record_call(0x000310, 0x000300);
    assert_eq!(BlockKind::Function, cfg.block(0x000300).unwrap().kind());

    cfg.record_branch(0x000320, 0x000300);
    let block = cfg.block(0x000300).unwrap();
    assert_eq!(BlockKind::Function, block.kind());
    assert_eq!("fun_000300", block.name());
}

#[test]
fn popping_an_empty_stack_is_tolerated() {
    let mut cfg = anchored();

    cfg.record_return(0x000110, 0x000200);

    assert_eq!(0, cfg.depth());
    assert_eq!(Some(0x000200), cfg.current());
}

#[test]
#[should_panic(expected = "before tracing was anchored")]
fn transfer_without_anchor_is_fatal() {
    let mut cfg = Cfg::new();

    cfg.record_branch(0x000110, 0x000200);
}

#[test]
fn depth_tracks_net_calls_minus_returns() {
    let mut cfg = anchored();

    cfg.record_call(0x000104, 0x000400);
    cfg.push_frame(StackFrame::enter(0, 0x0400));
    cfg.record_call(0x000404, 0x000500);
    cfg.push_frame(StackFrame::enter(0, 0x0500));
    cfg.record_call(0x000504, 0x000600);
    cfg.push_frame(StackFrame::enter(0, 0x0600));
    cfg.record_return(0x000604, 0x000508);

    assert_eq!(2, cfg.depth());
}

#[test]
fn dump_renders_blocks_and_statements() {
    let mut cfg = anchored();

    cfg.record_call(0x000104, 0x001234);
    cfg.record_return(0x00123A, 0x000108);

    let dump = cfg.dump();

    assert!(dump.contains("Basic Block at 000100: fun_000100"));
    assert!(dump.contains("Basic Block at 001234: fun_001234"));
    assert!(dump.contains("    000104: fun_001234();"));
    assert!(dump.contains("    00123A: return;"));
}

#[test]
fn backtrace_renders_innermost_first() {
    let mut cfg = anchored();

    cfg.push_frame(StackFrame::enter(0x00, 0x0400));
    cfg.push_frame(StackFrame::enter(0x04, 0xD2A6));
    cfg.mark_link_spilled(0x8FFC);

    let trace = cfg.backtrace();
    let lines: Vec<&str> = trace.lines().collect();

    assert_eq!("call stack (innermost first):", lines[0]);
    assert_eq!(
        "  #0 fun_04D2A6 at 04:D2A6 (return address spilled at 8FFC)",
        lines[1]
    );
    assert_eq!("  #1 fun_000400 at 00:0400", lines[2]);
}

#[test]
fn empty_backtrace_renders_placeholder() {
    let cfg = Cfg::new();

    assert_eq!("call stack is empty\n", cfg.backtrace());
}
