use super::*;

#[test]
fn test_plain_formatting_has_no_escape_codes() {
    let styling = StyleManager::plain();

    assert_eq!(styling.format_success("done"), "+ done");
    assert_eq!(styling.format_error("failed"), "x failed");
    assert_eq!(styling.format_warning("careful"), "! careful");
    assert_eq!(styling.format_info("note"), "- note");
    assert!(!styling.style_emphasis("bold").contains('\u{1b}'));
}

#[test]
fn test_unicode_symbols_selected() {
    let styling = StyleManager::new(false, true);
    assert!(styling.is_unicode());
    assert_eq!(styling.format_success("done"), "✓ done");
}

#[test]
fn test_colors_add_escape_codes() {
    let styling = StyleManager::new(true, false);
    assert!(styling.colors_enabled());
    assert!(styling.style_error("boom").contains('\u{1b}'));
}
