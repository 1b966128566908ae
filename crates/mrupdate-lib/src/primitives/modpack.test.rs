#[test]
fn test_loader_family_strips_manifest_suffix() {
    assert_eq!(LoaderFamily::parse("quilt-loader"), LoaderFamily::Quilt);
    assert_eq!(LoaderFamily::parse("fabric-loader"), LoaderFamily::Fabric);
    assert_eq!(LoaderFamily::parse("Forge"), LoaderFamily::Forge);
    assert_eq!(LoaderFamily::parse("neoforge"), LoaderFamily::NeoForge);
}

#[test]
fn test_neoforge_is_not_forge() {
    assert_ne!(LoaderFamily::parse("neoforge"), LoaderFamily::Forge);
}

#[test]
fn test_unknown_loader_kept_lowercased() {
    assert_eq!(
        LoaderFamily::parse("LiteLoader"),
        LoaderFamily::Other("liteloader".to_string())
    );
    assert_eq!(LoaderFamily::parse("LiteLoader").tag(), "liteloader");
}

#[test]
fn test_side_env_for_mode() {
    let client = SideEnv::for_mode(GenerationMode::Client);
    assert_eq!(client.client, SideRequirement::Required);
    assert_eq!(client.server, SideRequirement::Unsupported);

    let server = SideEnv::for_mode(GenerationMode::Server);
    assert_eq!(server.client, SideRequirement::Unsupported);
    assert_eq!(server.server, SideRequirement::Required);
}

#[test]
fn test_side_requirement_unknown_values() {
    let parsed: SideRequirement = serde_json::from_str("\"unknown\"").unwrap();
    assert_eq!(parsed, SideRequirement::Unknown);

    let parsed: SideRequirement = serde_json::from_str("\"optional\"").unwrap();
    assert_eq!(parsed, SideRequirement::Optional);
}
