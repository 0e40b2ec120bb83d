//! Container build recipes stay buildable with the workspace toolchain

const WORKSPACE_MANIFEST: &str = include_str!("../../Cargo.toml");
const CARGO_CONFIG: &str = include_str!("../../.cargo/config.toml");

const RECIPES: [(&str, &str, &str); 3] = [
    (
        "Dockerfile",
        include_str!("../../Dockerfile"),
        r#"CMD ["academia-server", "--production"]"#,
    ),
    (
        "Dockerfile.dev",
        include_str!("../../Dockerfile.dev"),
        r#"CMD ["academia-server"]"#,
    ),
    (
        "Dockerfile.alpine",
        include_str!("../../Dockerfile.alpine"),
        r#"CMD ["academia-server", "--host", "0.0.0.0", "--port", "8080"]"#,
    ),
];

fn parse_version(version: &str) -> (u32, u32) {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap());
    (parts.next().unwrap(), parts.next().unwrap_or(0))
}

fn workspace_rust_version() -> (u32, u32) {
    let line = WORKSPACE_MANIFEST
        .lines()
        .find(|line| line.trim_start().starts_with("rust-version"))
        .expect("workspace declares rust-version");
    let value = line.split('=').nth(1).unwrap().trim().trim_matches('"');
    parse_version(value)
}

/// Versions of every `FROM rust:<version>-...` line in a recipe
fn rust_images(recipe: &str) -> Vec<(u32, u32)> {
    recipe
        .lines()
        .filter_map(|line| line.trim().strip_prefix("FROM rust:"))
        .map(|image| parse_version(image.split('-').next().unwrap()))
        .collect()
}

#[test]
fn test_builder_images_meet_rust_version() {
    let required = workspace_rust_version();
    for (name, recipe, _) in RECIPES {
        let images = rust_images(recipe);
        assert!(!images.is_empty(), "{} has no rust builder", name);
        for image in images {
            assert!(
                image >= required,
                "{} builds with rust {:?}, workspace needs {:?}",
                name,
                image,
                required
            );
        }
    }
}

#[test]
fn test_resolver_respects_rust_version() {
    let resolver = CARGO_CONFIG
        .lines()
        .skip_while(|line| line.trim() != "[resolver]")
        .find(|line| line.trim_start().starts_with("incompatible-rust-versions"))
        .expect("resolver section sets incompatible-rust-versions");
    assert!(resolver.contains("\"fallback\""));

    for (name, recipe, _) in RECIPES {
        assert!(
            recipe.lines().any(|line| line.trim() == "COPY .cargo .cargo"),
            "{} does not copy the cargo config",
            name
        );
    }
}

#[test]
fn test_recipes_expose_port_and_entry_command() {
    for (name, recipe, command) in RECIPES {
        assert!(recipe.contains("EXPOSE 8080"), "{}", name);
        assert!(recipe.contains("WORKDIR "), "{}", name);
        assert_eq!(
            recipe.lines().filter(|line| line.starts_with("CMD ")).last(),
            Some(command),
            "{}",
            name
        );
    }
}
