use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PaintError::invalid_argument("x")
            .to_string()
            .contains("invalid argument:")
    );
    assert!(
        PaintError::out_of_memory("x")
            .to_string()
            .contains("out of memory:")
    );
    assert!(PaintError::pattern("x").to_string().contains("pattern error:"));
    assert!(
        PaintError::UnsupportedFormat(PixelFormat::A8)
            .to_string()
            .contains("unsupported pixel format: A8")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PaintError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
