use std::path::Path;

fn main() {
    // Generate the fixture models for the compile tests
    // The generated code is only used by tests (via include!), so it won't
    // affect normal library compilation
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let mut config = modelgen::GeneratorConfig::from_file(Path::new("fixtures/modelgen.toml"))
        .expect("fixture config");
    config.output_dir = out_dir.into();
    config.format_output = false;

    let report = modelgen::generate(&config).expect("codegen failed");
    assert!(report.is_success(), "codegen failures: {:?}", report);

    println!("cargo:rerun-if-changed=fixtures/schema.sql");
    println!("cargo:rerun-if-changed=fixtures/modelgen.toml");
}
