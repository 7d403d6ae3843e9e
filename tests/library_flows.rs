//! End-to-end tests for the Frank fat-lib and dylib pipelines.

use std::fs;

use calabash_dist::exec::{Script, ScriptedRunner};
use calabash_dist::{Layout, Pipeline};
use tempfile::TempDir;

fn setup_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("build/Debug-iphoneos")).unwrap();
    fs::create_dir_all(root.join("build/Debug-iphonesimulator")).unwrap();
    dir
}

fn write_frank_libs(dir: &TempDir) {
    fs::write(
        dir.path().join("build/Debug-iphoneos/libFrankCalabashDevice.a"),
        b"FRANK-DEVICE",
    )
    .unwrap();
    fs::write(
        dir.path().join("build/Debug-iphonesimulator/libFrankCalabash.a"),
        b"FRANK-SIM",
    )
    .unwrap();
}

fn write_dylibs(dir: &TempDir) {
    fs::write(
        dir.path().join("build/Debug-iphoneos/libCalabashDyn.dylib"),
        b"DYN-DEVICE",
    )
    .unwrap();
    fs::write(
        dir.path().join("build/Debug-iphonesimulator/libCalabashDynSim.dylib"),
        b"DYN-SIM",
    )
    .unwrap();
}

fn scripted_toolchain() -> ScriptedRunner {
    ScriptedRunner::new(vec![
        Script::for_program("xcrun").with_arg("-create").touches_output_of("-output"),
        Script::for_program("xcrun").with_arg("-verify_arch"),
        Script::for_program("xcrun")
            .with_arg("-info")
            .stdout("Architectures in the fat file are: x86_64 armv7 armv7s arm64"),
    ])
}

#[test]
fn frank_flow_combines_verifies_and_publishes() {
    let dir = setup_root();
    write_frank_libs(&dir);

    let runner = scripted_toolchain();
    let layout = Layout::new(dir.path());
    let pipeline = Pipeline::new(layout.clone(), &runner);

    pipeline.frank().unwrap();

    // combined in staging, then published at the root
    assert!(layout.staging_dir().join("libFrankCalabash.a").is_file());
    assert!(dir.path().join("libFrankCalabash.a").is_file());

    assert!(runner.saw("lipo -create"));
    assert!(runner.saw("libFrankCalabashDevice.a"));
    // the combined lib is checked against lipo's default arch set
    for arch in ["x86_64", "armv7", "armv7s", "arm64"] {
        assert!(runner.saw(&format!("-verify_arch {}", arch)));
    }
    assert!(runner.saw("-sdk iphonesimulator"));
}

#[test]
fn frank_flow_missing_input_reports_artifact() {
    let dir = setup_root();
    // device frank lib never built
    fs::write(
        dir.path().join("build/Debug-iphonesimulator/libFrankCalabash.a"),
        b"FRANK-SIM",
    )
    .unwrap();

    let runner = scripted_toolchain();
    let pipeline = Pipeline::new(Layout::new(dir.path()), &runner);

    let err = pipeline.frank().unwrap_err();
    assert!(err.to_string().contains("libFrankCalabashDevice.a"));
    assert!(!dir.path().join("libFrankCalabash.a").exists());
}

#[test]
fn frank_flow_rejects_empty_inputs() {
    let dir = setup_root();
    // build produced zero-byte outputs, e.g. an interrupted archive step
    fs::write(
        dir.path().join("build/Debug-iphoneos/libFrankCalabashDevice.a"),
        b"",
    )
    .unwrap();
    fs::write(
        dir.path().join("build/Debug-iphonesimulator/libFrankCalabash.a"),
        b"",
    )
    .unwrap();

    let runner = scripted_toolchain();
    let pipeline = Pipeline::new(Layout::new(dir.path()), &runner);

    let err = pipeline.frank().unwrap_err();
    assert!(err.to_string().contains("non-empty"));

    // nothing was combined or published
    assert!(runner.calls().is_empty());
    assert!(!dir.path().join("libFrankCalabash.a").exists());
}

#[test]
fn frank_flow_combine_failure_propagates_exit_code() {
    let dir = setup_root();
    write_frank_libs(&dir);

    let runner = ScriptedRunner::new(vec![
        Script::for_program("xcrun")
            .with_arg("-create")
            .fails(5, "lipo: input file must be a fat file"),
    ]);
    let pipeline = Pipeline::new(Layout::new(dir.path()), &runner);

    let err = pipeline.frank().unwrap_err();
    assert_eq!(err.exit_code(), 5);
    assert!(err.to_string().contains("fat file"));
}

#[test]
fn dylib_flow_publishes_both_dylibs() {
    let dir = setup_root();
    write_dylibs(&dir);

    let runner = scripted_toolchain();
    let layout = Layout::new(dir.path());
    let pipeline = Pipeline::new(layout.clone(), &runner);

    pipeline.dylibs().unwrap();

    let published = layout.published_dylibs_dir();
    assert_eq!(fs::read_dir(&published).unwrap().count(), 2);
    assert_eq!(
        fs::read(published.join("libCalabashDyn.dylib")).unwrap(),
        b"DYN-DEVICE"
    );
    assert_eq!(
        fs::read(published.join("libCalabashDynSim.dylib")).unwrap(),
        b"DYN-SIM"
    );

    // device checked against iphoneos, simulator against iphonesimulator
    assert!(runner.saw("-sdk iphoneos"));
    assert!(runner.saw("-sdk iphonesimulator"));
}

#[test]
fn dylib_flow_missing_input_leaves_prior_output_untouched() {
    let dir = setup_root();
    // only the device dylib exists
    fs::write(
        dir.path().join("build/Debug-iphoneos/libCalabashDyn.dylib"),
        b"DYN-DEVICE",
    )
    .unwrap();

    // a previous run's output is present
    let layout = Layout::new(dir.path());
    let published = layout.published_dylibs_dir();
    fs::create_dir_all(&published).unwrap();
    fs::write(published.join("libCalabashDyn.dylib"), b"PRIOR").unwrap();

    let runner = scripted_toolchain();
    let pipeline = Pipeline::new(layout, &runner);

    let err = pipeline.dylibs().unwrap_err();
    assert!(err.to_string().contains("libCalabashDynSim.dylib"));

    // old directory untouched, no verification attempted
    assert_eq!(fs::read(published.join("libCalabashDyn.dylib")).unwrap(), b"PRIOR");
    assert!(runner.calls().is_empty());
}

#[test]
fn dylib_flow_rejects_empty_dylib() {
    let dir = setup_root();
    write_dylibs(&dir);
    fs::write(
        dir.path().join("build/Debug-iphonesimulator/libCalabashDynSim.dylib"),
        b"",
    )
    .unwrap();

    let runner = scripted_toolchain();
    let layout = Layout::new(dir.path());
    let pipeline = Pipeline::new(layout.clone(), &runner);

    let err = pipeline.dylibs().unwrap_err();
    assert!(err.to_string().contains("non-empty"));
    assert!(!layout.published_dylibs_dir().exists());
}

#[test]
fn dylib_flow_missing_arch_blocks_publication() {
    let dir = setup_root();
    write_dylibs(&dir);

    let runner = ScriptedRunner::new(vec![
        Script::for_program("xcrun").with_arg("-verify_arch").fails(1, ""),
    ]);
    let layout = Layout::new(dir.path());
    let pipeline = Pipeline::new(layout.clone(), &runner);

    let err = pipeline.dylibs().unwrap_err();
    assert!(err.to_string().contains("arm64"));
    assert!(!layout.published_dylibs_dir().exists());
}

#[test]
fn sim_dylib_flow_publishes_simulator_only() {
    let dir = setup_root();
    // device dylib deliberately absent; the sim flow must not need it
    fs::write(
        dir.path().join("build/Debug-iphonesimulator/libCalabashDynSim.dylib"),
        b"DYN-SIM",
    )
    .unwrap();

    let runner = scripted_toolchain();
    let layout = Layout::new(dir.path());
    let pipeline = Pipeline::new(layout.clone(), &runner);

    pipeline.sim_dylib().unwrap();

    let published = layout.published_dylibs_dir();
    assert_eq!(fs::read_dir(&published).unwrap().count(), 1);
    assert!(published.join("libCalabashDynSim.dylib").is_file());
    assert!(!runner.saw("-sdk iphoneos"));
}

#[test]
fn sim_dylib_flow_replaces_prior_set() {
    let dir = setup_root();
    write_dylibs(&dir);

    let layout = Layout::new(dir.path());
    let published = layout.published_dylibs_dir();
    fs::create_dir_all(&published).unwrap();
    fs::write(published.join("libCalabashDyn.dylib"), b"PRIOR-DEVICE").unwrap();

    let runner = scripted_toolchain();
    let pipeline = Pipeline::new(layout, &runner);
    pipeline.sim_dylib().unwrap();

    // exactly one generation: only the freshly staged simulator dylib
    assert_eq!(fs::read_dir(&published).unwrap().count(), 1);
    assert!(!published.join("libCalabashDyn.dylib").exists());
}
