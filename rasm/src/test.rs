use crate::*;
use matches::assert_matches;
use obfile::{EntryPoint, ExternalRef, Listing};
use rm20::*;

/// Runs the whole pipeline on in-memory source, insisting that no line is
/// rejected.
fn assemble_str(source: &str) -> (Shared, Artifacts) {
    let mut expanded = Vec::new();
    preprocess(source.as_bytes(), &mut expanded).unwrap();

    let mut shared = Shared::new();
    let errors = firstpass(&expanded[..], &mut shared).unwrap();
    assert_eq!(errors, 0, "first pass rejected lines");

    let (artifacts, errors) = secondpass(&expanded[..], &mut shared).unwrap();
    assert_eq!(errors, 0, "second pass rejected lines");

    (shared, artifacts)
}

fn firstpass_errors(source: &str) -> u32 {
    let mut shared = Shared::new();
    firstpass(source.as_bytes(), &mut shared).unwrap()
}

fn secondpass_errors(source: &str) -> u32 {
    let mut shared = Shared::new();
    assert_eq!(firstpass(source.as_bytes(), &mut shared).unwrap(), 0);
    let (_, errors) = secondpass(source.as_bytes(), &mut shared).unwrap();
    errors
}

fn listing_text(shared: &Shared) -> String {
    let mut out = Vec::new();
    obfile::write_listing(&mut out, &Listing::copy_from(&shared.code_seg, &shared.data_seg))
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn empty_program() {
    let (shared, artifacts) = assemble_str("; nothing to see\n\n   \t \n");

    assert!(shared.code_seg.is_empty());
    assert!(shared.data_seg.is_empty());
    assert!(artifacts.entrypoints.is_empty());
    assert!(artifacts.externals.is_empty());
    assert_eq!(listing_text(&shared), "0 0\n");
}

#[test]
fn single_stop() {
    let (shared, _) = assemble_str("stop\n");

    assert_eq!(
        shared.code_seg,
        vec![make_first_inst_word(15, Linkage::Absolute)]
    );
    assert!(shared.data_seg.is_empty());
    assert_eq!(shared.instructions.len(), 1);
    assert_eq!(shared.instructions[0].address, 100);
    assert_eq!(listing_text(&shared), "1 0\n0100 A4-B8-C0-D0-E0\n");
}

#[test]
fn labeled_data() {
    let (shared, _) = assemble_str("X: .data 5,-3,7\n");

    assert_eq!(
        shared.data_seg,
        vec![make_data_word(5), make_data_word(-3), make_data_word(7)]
    );
    assert_eq!(shared.data_seg[1], 0xFFFD | A_FLAG);

    let x = shared.symtable.find("X").unwrap();
    assert_eq!(x.base_addr, 96);
    assert_eq!(x.offset, 4);
    assert_eq!(x.address(), 100);
}

#[test]
fn string_directive() {
    let (shared, _) = assemble_str("S: .string \"ab\"\n");

    assert_eq!(
        shared.data_seg,
        vec![make_data_word('a' as Word), make_data_word('b' as Word), make_data_word(0)]
    );
    assert_eq!(shared.symtable.find("S").unwrap().address(), 100);
}

#[test]
fn forward_direct_reference() {
    let (shared, artifacts) = assemble_str("mov X, r1\nX: .data 0\n");

    // Opcode word, register/funct word, then the two completed words for X.
    assert_eq!(
        shared.code_seg,
        vec![
            make_first_inst_word(0, Linkage::Absolute),
            make_second_inst_word(3, 1, 1, 0, 0, Linkage::Absolute),
            make_extra_inst_word(96, Linkage::Relocatable),
            make_extra_inst_word(8, Linkage::Relocatable),
        ]
    );
    assert_eq!(shared.data_seg, vec![make_data_word(0)]);
    assert_eq!(shared.instructions[0].operand_symbols, ["X".to_owned(), String::new()]);

    // X lives right after the four code words.
    assert_eq!(shared.symtable.find("X").unwrap().address(), 104);
    assert!(artifacts.externals.is_empty());
}

#[test]
fn index_operand() {
    let (shared, _) = assemble_str("mov W[r3], r1\nW: .data 9\n");

    assert_eq!(
        shared.code_seg,
        vec![
            make_first_inst_word(0, Linkage::Absolute),
            make_second_inst_word(3, 1, 2, 3, 0, Linkage::Absolute),
            make_extra_inst_word(96, Linkage::Relocatable),
            make_extra_inst_word(8, Linkage::Relocatable),
        ]
    );
}

#[test]
fn external_reference() {
    let (shared, artifacts) = assemble_str(".extern E\njmp E\n");

    assert_eq!(
        shared.code_seg,
        vec![
            make_first_inst_word(9, Linkage::Absolute),
            make_second_inst_word(1, 0, 0, 0, 10, Linkage::Absolute),
            make_extra_inst_word(0, Linkage::External),
            make_extra_inst_word(0, Linkage::External),
        ]
    );
    assert!(artifacts.entrypoints.is_empty());
    assert_eq!(
        artifacts.externals,
        vec![ExternalRef {
            label: "E".to_owned(),
            base_word_addr: 102,
            offset_word_addr: 103,
        }]
    );
    assert!(shared.symtable.find("E").unwrap().ext);
}

#[test]
fn entry_listing() {
    let (_, artifacts) = assemble_str("MAIN: stop\n.entry MAIN\n");

    assert_eq!(
        artifacts.entrypoints,
        vec![EntryPoint {
            label: "MAIN".to_owned(),
            base_addr: 96,
            offset: 4,
        }]
    );
}

#[test]
fn negative_immediate_stays_in_the_value_field() {
    let (shared, _) = assemble_str("prn #-1\n");

    assert_eq!(shared.code_seg[2], 0xFFFF | A_FLAG);
}

#[test]
fn label_alone_names_the_next_code_address() {
    let (shared, _) = assemble_str("HERE:\nstop\n");

    assert_eq!(shared.symtable.find("HERE").unwrap().address(), 100);
}

#[test]
fn macro_expansion() {
    let (shared, _) = assemble_str("macro greet\nprn #1\nendm\ngreet\ngreet\n");

    let one_greet = vec![
        make_first_inst_word(13, Linkage::Absolute),
        make_second_inst_word(0, 0, 0, 0, 0, Linkage::Absolute),
        make_extra_inst_word(1, Linkage::Absolute),
    ];
    let expected: Vec<Word> = one_greet.iter().chain(one_greet.iter()).cloned().collect();

    assert_eq!(shared.code_seg, expected);
    assert_eq!(shared.instructions.len(), 2);
    assert_eq!(shared.instructions[0].address, 100);
    assert_eq!(shared.instructions[1].address, 103);

    // The macro name never becomes a symbol.
    assert_matches!(shared.symtable.find("greet"), None);
}

#[test]
fn program_with_all_statement_kinds() {
    let source = "\
; counts down from three
macro setup
mov #3, r1
endm
setup
LOOP: dec r1
bne LOOP
jsr Report
stop
MSG: .string \"done\"
COUNT: .data 3, 2, 1
.extern Report
.entry LOOP
";
    let (shared, artifacts) = assemble_str(source);

    assert_eq!(shared.code_seg.len(), 14);
    assert_eq!(shared.data_seg.len(), 8);
    assert_eq!(shared.instructions.len(), 5);

    let loop_sym = shared.symtable.find("LOOP").unwrap();
    assert_eq!(loop_sym.address(), 103);

    // bne's reserved words hold LOOP's split address.
    assert_eq!(shared.code_seg[7], make_extra_inst_word(96, Linkage::Relocatable));
    assert_eq!(shared.code_seg[8], make_extra_inst_word(7, Linkage::Relocatable));

    // jsr's reserved words await the external Report symbol.
    assert_eq!(shared.code_seg[11], make_extra_inst_word(0, Linkage::External));
    assert_eq!(shared.code_seg[12], make_extra_inst_word(0, Linkage::External));
    assert!(shared.symtable.find("Report").unwrap().ext);

    // Data symbols sit after the 14 code words.
    assert_eq!(shared.symtable.find("MSG").unwrap().address(), 114);
    assert_eq!(shared.symtable.find("COUNT").unwrap().address(), 119);
    assert_eq!(*shared.data_seg.last().unwrap(), make_data_word(1));

    assert_eq!(
        artifacts.entrypoints,
        vec![EntryPoint {
            label: "LOOP".to_owned(),
            base_addr: 96,
            offset: 7,
        }]
    );
    assert_eq!(
        artifacts.externals,
        vec![ExternalRef {
            label: "Report".to_owned(),
            base_word_addr: 111,
            offset_word_addr: 112,
        }]
    );
}

#[test]
fn first_pass_is_deterministic() {
    let source = "mov X, r1\nX: .data 4\nprn #7\n";

    let mut first = Shared::new();
    assert_eq!(firstpass(source.as_bytes(), &mut first).unwrap(), 0);

    let mut second = Shared::new();
    assert_eq!(firstpass(source.as_bytes(), &mut second).unwrap(), 0);

    assert_eq!(first.code_seg, second.code_seg);
    assert_eq!(first.data_seg, second.data_seg);
    assert_eq!(first.instructions, second.instructions);
}

#[test]
fn label_length_boundary() {
    let ok = format!("{}: stop\n", "A".repeat(31));
    assert_eq!(firstpass_errors(&ok), 0);

    let too_long = format!("{}: stop\n", "A".repeat(32));
    assert_eq!(firstpass_errors(&too_long), 1);
}

#[test]
fn register_range_boundary() {
    assert_eq!(firstpass_errors("clr r0\n"), 0);
    assert_eq!(firstpass_errors("clr r15\n"), 0);
    assert_eq!(firstpass_errors("clr r16\n"), 1);
    assert_eq!(firstpass_errors("mov X[r15], r1\nX: .data 1\n"), 0);
    assert_eq!(firstpass_errors("mov X[r16], r1\nX: .data 1\n"), 1);
}

#[test]
fn first_pass_rejections() {
    // Unknown mnemonic.
    assert_eq!(firstpass_errors("halt\n"), 1);
    // Duplicate label.
    assert_eq!(firstpass_errors("X: stop\nX: stop\n"), 1);
    // Wrong operand count.
    assert_eq!(firstpass_errors("mov r1\n"), 1);
    // lea refuses an immediate source.
    assert_eq!(firstpass_errors("lea #1, r2\n"), 1);
    // Unknown directive.
    assert_eq!(firstpass_errors(".bogus 1\n"), 1);
    // Unterminated string.
    assert_eq!(firstpass_errors(".string \"abc\n"), 1);
    // Blank token inside an operand list.
    assert_eq!(firstpass_errors("mov r1,,r2\n"), 1);
    // Overlong line.
    assert_eq!(firstpass_errors(&format!("{}\n", "x".repeat(81))), 1);
}

#[test]
fn one_bad_line_does_not_poison_the_rest() {
    let mut shared = Shared::new();
    let errors = firstpass("halt\nstop\n".as_bytes(), &mut shared).unwrap();

    assert_eq!(errors, 1);
    assert_eq!(
        shared.code_seg,
        vec![make_first_inst_word(15, Linkage::Absolute)]
    );
}

#[test]
fn second_pass_rejections() {
    // Unresolved label.
    assert_eq!(secondpass_errors("jmp NOWHERE\n"), 1);
    // Entry for an unknown symbol.
    assert_eq!(secondpass_errors(".entry MISSING\n"), 1);
    // Entry without a symbol name.
    assert_eq!(secondpass_errors(".entry\n"), 1);
}

#[test]
fn data_segment_capacity() {
    let full: String = ".data 1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16\n"
        .repeat(MAX_DATA_SEGMENT_LEN / 16);

    let mut shared = Shared::new();
    assert_eq!(firstpass(full.as_bytes(), &mut shared).unwrap(), 0);
    assert_eq!(shared.data_seg.len(), MAX_DATA_SEGMENT_LEN);

    let overfull = format!("{}.data 1\n", full);
    let mut shared = Shared::new();
    assert_eq!(firstpass(overfull.as_bytes(), &mut shared).unwrap(), 1);
    // The rejected line leaves the segment exactly full.
    assert_eq!(shared.data_seg.len(), MAX_DATA_SEGMENT_LEN);
}
