use crate::io::ply::Encoding;


/// Returns a `Cursor` over the given file in the `test_files/` directory next
/// to the module using this macro.
macro_rules! include_test_file {
    ($filename:expr) => {{
        let bytes = include_bytes!(concat!("test_files/", $filename)) as &[u8];
        std::io::Cursor::new(bytes)
    }}
}

/// Builds a complete PLY file from the given header lines (without magic,
/// `format` and `end_header`) and body.
pub(crate) fn ply_file(encoding: Encoding, header: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!("ply\nformat {} 1.0\n{}end_header\n", encoding, header).into_bytes();
    out.extend_from_slice(body);
    out
}
