//! End-to-end patch sessions against simulated processes

use pretty_assertions::assert_eq;
use verpatch::core::types::{Address, ErrorKind, PatchError, VersionValue};
use verpatch::memory::ScanOptions;
use verpatch::process::{ProcessMemory, SimulatedProcess};
use verpatch::session::{PatchRequest, PatchSession, PatchState};
use verpatch::VersionSpec;

const BASE: Address = Address::new(0x7FFA_1000_0000);
const MODULE_PATH: &str = r"C:\Program Files\Tencent\WeChat\[3.9.6.33]\WeChatWin.dll";

fn dotted(version: &str) -> VersionSpec {
    VersionSpec::Dotted(version.to_string())
}

fn wechat(image: Vec<u8>) -> SimulatedProcess {
    SimulatedProcess::builder()
        .pid(4242)
        .module(r"C:\Program Files\Tencent\WeChat\WeChat.exe", Address::new(0x1_4000_0000), 0x10_0000)
        .module_image(MODULE_PATH, BASE, image)
        .module(r"C:\Windows\System32\kernel32.dll", Address::new(0x7FFB_0000_0000), 0x1000)
        .build()
}

fn request(current: &str, target: &str, options: ScanOptions) -> PatchRequest {
    PatchRequest::new("WeChatWin.dll", dotted(current), dotted(target)).with_scan_options(options)
}

#[test]
fn test_single_stamp_rewritten() {
    let mut image = vec![0u8; 0x10_0000];
    image[0x8_1234..0x8_1238].copy_from_slice(&0x6309_0621u32.to_le_bytes());
    let process = wechat(image);

    let report = PatchSession::new(
        &process,
        request("3.9.6.33", "3.9.12.51", ScanOptions::new(0x10_0000, 0x4000)),
    )
    .run()
    .unwrap();

    assert_eq!(report.offsets, vec![0x8_1234]);
    assert_eq!(report.written, 1);
    assert_eq!(report.module.base_address, BASE);
    assert_eq!(
        process.read_bytes(BASE.add(0x8_1234), 4).unwrap(),
        vec![0x33, 0x0C, 0x09, 0x63]
    );
}

#[test]
fn test_second_run_finds_nothing() {
    let mut image = vec![0u8; 0x1000];
    image[0x100..0x104].copy_from_slice(&0x6309_0621u32.to_le_bytes());
    let process = wechat(image);
    let options = ScanOptions::new(0x1000, 0x400);

    PatchSession::new(&process, request("3.9.6.33", "3.9.12.51", options))
        .run()
        .unwrap();

    // Memory now holds only the target, so the default is not found again.
    let err = PatchSession::new(&process, request("3.9.6.33", "3.9.12.51", options))
        .run()
        .unwrap_err();
    assert!(matches!(err, PatchError::OffsetsNotFound { .. }));
}

#[test]
fn test_stamps_across_window_boundaries() {
    let chunk = 0x400;
    let offsets = vec![0x0, chunk - 2, 2 * chunk - 1, 3 * chunk - 3, 0xFFC];
    let mut image = vec![0u8; 0x1000];
    for &offset in &offsets {
        image[offset..offset + 4].copy_from_slice(&0x6309_0A1Bu32.to_le_bytes());
    }
    let process = wechat(image);

    let report = PatchSession::new(
        &process,
        request("3.9.10.27", "3.9.12.51", ScanOptions::new(0x1000, chunk)),
    )
    .run()
    .unwrap();

    assert_eq!(report.offsets, offsets);
    assert_eq!(report.written, offsets.len());
    for offset in offsets {
        assert_eq!(
            process.read_version(BASE.add(offset)).unwrap(),
            VersionValue::new(0x6309_0C33)
        );
    }
}

#[test]
fn test_unreadable_window_is_skipped() {
    let mut image = vec![0u8; 0x1000];
    image[0x10..0x14].copy_from_slice(&0x6309_0621u32.to_le_bytes());
    image[0x810..0x814].copy_from_slice(&0x6309_0621u32.to_le_bytes());
    let process = SimulatedProcess::builder()
        .module_image(MODULE_PATH, BASE, image)
        .unreadable(BASE.add(0x800), 0x400)
        .build();

    let report = PatchSession::new(
        &process,
        request("3.9.6.33", "3.9.12.51", ScanOptions::new(0x1000, 0x400)),
    )
    .run()
    .unwrap();
    assert_eq!(report.offsets, vec![0x10]);
}

#[test]
fn test_module_suffix_is_case_sensitive() {
    let process = wechat(vec![0u8; 0x100]);
    let req = PatchRequest::new("wechatwin.dll", dotted("3.9.6.33"), dotted("3.9.12.51"));

    let mut session = PatchSession::new(&process, req);
    let err = session.locate().unwrap_err();
    assert!(matches!(err, PatchError::ModuleNotFound(_)));
    assert_eq!(session.state(), &PatchState::Error(ErrorKind::ModuleNotFound));
}

#[test]
fn test_patch_through_trait_object() {
    let mut image = vec![0u8; 0x100];
    image[0x40..0x44].copy_from_slice(&0x6309_0621u32.to_le_bytes());
    let process: Box<dyn ProcessMemory> = Box::new(wechat(image));

    let report = PatchSession::new(
        process.as_ref(),
        request("3.9.6.33", "3.9.12.51", ScanOptions::new(0x100, 0x40)),
    )
    .run()
    .unwrap();
    assert_eq!(report.written, 1);
}
