use super::*;

#[test]
fn test_join_details() {
    assert_eq!(join("sodium", ""), "sodium");
    assert_eq!(join("sodium", "0.5.8"), "sodium: 0.5.8");
}

#[test]
fn test_status_lines_do_not_panic() {
    let styling = StyleManager::plain();
    let status = StatusDisplay::new(&styling);

    status.success("Sodium", "0.5.3 -> 0.5.8");
    status.error("Iris", "download failed");
    status.warning("No mods found for .mrpack generation");
    status.info("Minecraft version: 1.20.1");
    status.working("Checking mods");
    status.message("plain");
    status.subtle("secondary");
    status.list(&["a", "b"]);
    status.section("Summary");
    status.step(1, 3, "Loading manifest");
}
