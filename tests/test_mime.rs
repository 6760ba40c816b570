use palisade::http::mime::{content_type, lookup, MIME_TYPES};

#[test]
fn test_lookup_by_extension() {
    assert_eq!(content_type("/index.html"), "text/html");
    assert_eq!(content_type("/style.css"), "text/css");
    assert_eq!(content_type("/img/logo.png"), "image/png");
}

#[test]
fn test_lookup_is_case_insensitive() {
    assert_eq!(content_type("/INDEX.HTML"), "text/html");
    assert_eq!(content_type("/photo.JpG"), "image/jpeg");
}

#[test]
fn test_unknown_extension_falls_back_to_octet_stream() {
    assert_eq!(content_type("/data.xyz"), "application/octet-stream");
    assert_eq!(content_type("/no-extension"), "application/octet-stream");
}

#[test]
fn test_multi_part_extension_wins_over_suffix() {
    // table order puts tar.gz before gz
    assert_eq!(content_type("/backup.tar.gz"), "application/x-gtar-compressed");
    assert_eq!(content_type("/single.gz"), "application/x-gzip");
}

#[test]
fn test_extension_may_match_at_slash_boundary() {
    // the scan treats '/' like '.', so a bare filename equal to an
    // extension matches
    assert_eq!(content_type("/html"), "text/html");
}

#[test]
fn test_lookup_with_custom_table() {
    let table: &[(&str, &str)] = &[("conf", "text/plain")];
    assert_eq!(lookup(table, "/system.conf"), "text/plain");
    assert_eq!(lookup(table, "/index.html"), "application/octet-stream");
}

#[test]
fn test_builtin_table_is_ordered() {
    // earlier entries must win: both would match "x.tar.gz"
    let tar_gz = MIME_TYPES.iter().position(|(e, _)| *e == "tar.gz").unwrap();
    let gz = MIME_TYPES.iter().position(|(e, _)| *e == "gz").unwrap();
    assert!(tar_gz < gz);
}
