use super::*;
use rm20::constants::A_FLAG;

#[test]
fn listing_text_format() {
    let listing = Listing::from(vec![(1 << 15) | A_FLAG], vec![5 | A_FLAG]);
    let mut out = Vec::new();

    write_listing(&mut out, &listing).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "1 1\n\
         0100 A4-B8-C0-D0-E0\n\
         0101 A4-B0-C0-D0-E5\n"
    );
}

#[test]
fn empty_listing_is_just_the_header() {
    let listing = Listing::from(Vec::new(), Vec::new());
    let mut out = Vec::new();

    write_listing(&mut out, &listing).unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "0 0\n");
}

#[test]
fn entries_text_format() {
    let entrypoints = vec![
        EntryPoint {
            label: "MAIN".to_owned(),
            base_addr: 96,
            offset: 4,
        },
        EntryPoint {
            label: "LOOP".to_owned(),
            base_addr: 112,
            offset: 3,
        },
    ];
    let mut out = Vec::new();

    write_entries(&mut out, &entrypoints).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "MAIN,96,4\nLOOP,112,3\n"
    );
}

#[test]
fn externals_are_separated_by_blank_lines() {
    let externals = vec![
        ExternalRef {
            label: "E1".to_owned(),
            base_word_addr: 102,
            offset_word_addr: 103,
        },
        ExternalRef {
            label: "E2".to_owned(),
            base_word_addr: 106,
            offset_word_addr: 107,
        },
    ];
    let mut out = Vec::new();

    write_externals(&mut out, &externals).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "E1 BASE 102\nE1 OFFSET 103\n\nE2 BASE 106\nE2 OFFSET 107\n"
    );
}

#[test]
fn write_read() {
    let path = std::env::temp_dir().join("obfile_write_read.ob");

    let code = vec![(1 << 9) | A_FLAG, 0x12345, 96, 7];
    let data = vec![0x41 | A_FLAG, A_FLAG];
    let listing_orig = Listing::from(code, data);

    write_listing_file(&path, &listing_orig).unwrap();

    let listing_read = read_listing_file(&path).unwrap();

    assert_eq!(listing_orig, listing_read);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn read_rejects_truncated_listing() {
    let text = "2 0\n0100 A4-B8-C0-D0-E0\n";
    let err = read_listing(&mut text.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn read_rejects_malformed_word_line() {
    let text = "1 0\n0100 whatever\n";
    let err = read_listing(&mut text.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}
