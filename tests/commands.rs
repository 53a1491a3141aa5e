mod common;

use std::path::PathBuf;

use common::{dat_file, temp_dir, write_file};
use wlicloud::commands::pointcloud::{convert, summary};
use wlicloud::{CloudFormat, Config, DatConvertArgs, DatSummaryArgs};

fn convert_args(input: PathBuf, output: Option<PathBuf>) -> DatConvertArgs {
    DatConvertArgs {
        input,
        output,
        format: None,
        ascii: false,
        double: false,
        encoding: None,
        skip_invalid: false,
        recursive: false,
    }
}

#[test]
fn single_file_defaults_to_ply_next_to_input() {
    let input = dat_file("1;2;3\n");
    convert::execute(convert_args(input.clone(), None), &Config::default()).unwrap();
    assert!(input.with_extension("ply").exists());
}

#[test]
fn format_follows_output_extension() {
    let input = dat_file("1;2;3\n");
    let output = temp_dir().join("cloud.pcd");
    convert::execute(
        convert_args(input, Some(output.clone())),
        &Config::default(),
    )
    .unwrap();
    assert!(output.exists());
}

#[test]
fn explicit_format_must_match_output() {
    let input = dat_file("1;2;3\n");
    let root = temp_dir();
    let output = root.join("new/dir/out.txt");
    let mut args = convert_args(input, Some(output.clone()));
    args.format = Some(CloudFormat::Ply);
    assert!(convert::execute(args, &Config::default()).is_err());
    assert!(!output.exists());
    assert!(!root.join("new").exists());
}

#[test]
fn config_supplies_the_default_format() {
    let input = dat_file("1;2;3\n");
    let config = Config {
        format: Some(CloudFormat::Pcd),
        ..Config::default()
    };
    convert::execute(convert_args(input.clone(), None), &config).unwrap();
    assert!(input.with_extension("pcd").exists());
}

#[test]
fn directory_conversion_mirrors_layout() {
    let input = temp_dir();
    std::fs::create_dir_all(input.join("day2")).unwrap();
    write_file(&input.join("a.dat"), "1;2;3\n");
    write_file(&input.join("day2/b.DAT"), "4;5;6\n7;8;9\n");
    write_file(&input.join("notes.txt"), "not a measurement");

    let output = temp_dir();
    let mut args = convert_args(input.clone(), Some(output.clone()));
    args.format = Some(CloudFormat::Pcd);
    args.recursive = true;
    convert::execute(args, &Config::default()).unwrap();

    assert!(output.join("a.pcd").exists());
    assert!(output.join("day2/b.pcd").exists());
    assert!(!output.join("notes.pcd").exists());
}

#[test]
fn directory_conversion_fails_when_a_file_fails() {
    let input = temp_dir();
    write_file(&input.join("good.dat"), "1;2;3\n");
    write_file(&input.join("bad.dat"), "1;2\n");

    let output = temp_dir();
    let result = convert::execute(
        convert_args(input.clone(), Some(output.clone())),
        &Config::default(),
    );
    assert!(result.is_err());
    assert!(output.join("good.ply").exists());
    assert!(!output.join("bad.ply").exists());

    let mut args = convert_args(input, Some(output.clone()));
    args.skip_invalid = true;
    convert::execute(args, &Config::default()).unwrap();
    assert!(output.join("bad.ply").exists());
}

#[test]
fn summary_of_file_and_directory() {
    let dir = temp_dir();
    write_file(&dir.join("a.dat"), "0;0;0\n1;0;0\n0;1;0\n0;0;1\n");
    write_file(&dir.join("b.dat"), "1;1;1\n2;2;2\n");

    let args = |input: PathBuf| DatSummaryArgs {
        input,
        recursive: false,
        encoding: None,
        skip_invalid: false,
        buckets: 4,
    };
    summary::execute(args(dir.join("a.dat")), &Config::default()).unwrap();
    summary::execute(args(dir.clone()), &Config::default()).unwrap();
}

#[test]
fn summary_rejects_unknown_encoding() {
    let dir = temp_dir();
    write_file(&dir.join("a.dat"), "0;0;0\n");
    let args = DatSummaryArgs {
        input: dir,
        recursive: false,
        encoding: Some("klingon".to_string()),
        skip_invalid: false,
        buckets: 10,
    };
    assert!(summary::execute(args, &Config::default()).is_err());
}
