//! End-to-end signing through the public API without a native module.

use std::fs;
use std::sync::Arc;
use std::thread;

use sign_core::{
    AppSettings, Error, Lifecycle, ServiceState, SignRequest, SignService, hex,
};
use tempfile::TempDir;

fn service_with_app_info(dir: &TempDir) -> SignService {
    let path = dir.path().join("appinfo.json");
    fs::write(
        &path,
        r#"{"Os":"Linux","CurrentVersion":"3.2.19-39038","AppId":1600001615}"#,
    )
    .unwrap();

    let mut settings = AppSettings::default();
    settings.sign_service.app_info_paths = vec![path];
    SignService::new(&settings.sign_service)
}

#[test]
fn test_mode_sign_roundtrip() {
    let dir = TempDir::new().unwrap();
    let mut service = service_with_app_info(&dir);
    service.start().unwrap();
    assert_eq!(service.state(), ServiceState::TestMode);

    let response = service
        .sign(&SignRequest {
            cmd: "810_9".to_string(),
            src: "0102AB".to_string(),
            seq: 1,
        })
        .unwrap();

    assert_eq!(response.platform, "Linux");
    assert_eq!(response.version, "3.2.19-39038");
    assert_eq!(hex::decode(&response.value.token).unwrap().len(), 32);
    assert_eq!(hex::decode(&response.value.extra).unwrap().len(), 64);
    assert_eq!(hex::decode(&response.value.sign).unwrap().len(), 64);

    service.stop();
    assert!(matches!(
        service.sign(&SignRequest {
            cmd: "810_9".to_string(),
            src: "01".to_string(),
            seq: 1,
        }),
        Err(Error::NotInitialized)
    ));
}

#[test]
fn test_mode_concurrent_signing() {
    let dir = TempDir::new().unwrap();
    let mut service = service_with_app_info(&dir);
    service.start().unwrap();

    let service = Arc::new(service);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for seq in 0..20 {
                    let response = service
                        .sign(&SignRequest {
                            cmd: format!("cmd_{}", i),
                            src: "DEADBEEF".to_string(),
                            seq,
                        })
                        .unwrap();
                    assert_eq!(response.value.token.len(), 64);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // All clones dropped, so exclusive ownership can be regained for unload.
    let mut service = Arc::try_unwrap(service).ok().unwrap();
    service.stop();
    assert_eq!(service.state(), ServiceState::Unloaded);
}
