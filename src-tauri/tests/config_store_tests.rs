use loopboard_lib::{ConfigStore, Settings};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// Test persisted configuration properties
#[cfg(test)]
mod config_store_tests {
    use super::*;

    fn temp_settings() -> (TempDir, Settings) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::open(dir.path().join("nested").join("data.json")).unwrap();
        (dir, Settings::new(store))
    }

    #[test]
    fn test_open_creates_empty_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("data.json");

        let store = ConfigStore::open(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
        assert!(store.keys().unwrap().is_empty());
        assert_eq!(store.key(0).unwrap(), None);
    }

    #[test]
    fn test_reopen_sees_previous_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");

        Settings::new(ConfigStore::open(&path).unwrap())
            .add_audio_file("/clips/kept.wav")
            .unwrap();

        let reopened = Settings::new(ConfigStore::open(&path).unwrap());
        assert_eq!(reopened.audio_files().unwrap(), vec!["/clips/kept.wav"]);
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let (_dir, settings) = temp_settings();
        let settings = Arc::new(settings);

        let writers: Vec<_> = (0..6)
            .map(|worker| {
                let settings = settings.clone();
                thread::spawn(move || {
                    for i in 0..15 {
                        settings
                            .add_audio_file(&format!("/clips/{}-{}.wav", worker, i))
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let files = settings.audio_files().unwrap();
        assert_eq!(files.len(), 90);
        for worker in 0..6 {
            let mine: Vec<_> = files
                .iter()
                .filter(|f| f.starts_with(&format!("/clips/{}-", worker)))
                .collect();
            let expected: Vec<String> =
                (0..15).map(|i| format!("/clips/{}-{}.wav", worker, i)).collect();
            assert_eq!(mine, expected.iter().collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_concurrent_bindings_and_devices_do_not_clobber() {
        let (_dir, settings) = temp_settings();
        let settings = Arc::new(settings);

        let binder = {
            let settings = settings.clone();
            thread::spawn(move || {
                for i in 0..30 {
                    settings
                        .set_audio_file_keybinding(&format!("/clips/{}.wav", i), &format!("F{}", i))
                        .unwrap();
                }
            })
        };
        let selector = {
            let settings = settings.clone();
            thread::spawn(move || {
                for i in 0..30u8 {
                    settings.set_capture_device_id(&hex::encode([i])).unwrap();
                }
            })
        };
        binder.join().unwrap();
        selector.join().unwrap();

        assert_eq!(settings.audio_file_keybindings().unwrap().len(), 30);
        assert_eq!(settings.capture_device_id().unwrap(), "1d");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_add_then_remove_restores_list(
            existing in prop::collection::vec("/[a-z]{1,8}\\.(wav|mp3)", 0..6),
            extra in "/[a-z]{1,8}\\.wav",
        ) {
            let (_dir, settings) = temp_settings();
            for path in &existing {
                settings.add_audio_file(path).unwrap();
            }
            let before = settings.audio_files().unwrap();

            settings.add_audio_file(&extra).unwrap();
            settings.remove_audio_file(&extra).unwrap();
            let after = settings.audio_files().unwrap();

            // The first occurrence goes; when `extra` was already listed the new
            // copy moves to the end, otherwise the list is exactly restored.
            if before.contains(&extra) {
                let mut sorted_before = before.clone();
                let mut sorted_after = after.clone();
                sorted_before.sort();
                sorted_after.sort();
                prop_assert_eq!(sorted_before, sorted_after);
            } else {
                prop_assert_eq!(before, after);
            }
        }

        #[test]
        fn prop_remove_is_idempotent(
            paths in prop::collection::vec("/[a-c]{1,2}\\.wav", 0..8),
            target in "/[a-c]{1,2}\\.wav",
        ) {
            let (_dir, settings) = temp_settings();
            for path in &paths {
                settings.add_audio_file(path).unwrap();
            }
            // Strip every copy so further removals have nothing left to take
            while settings.audio_files().unwrap().contains(&target) {
                settings.remove_audio_file(&target).unwrap();
            }
            let once = settings.audio_files().unwrap();
            settings.remove_audio_file(&target).unwrap();
            prop_assert_eq!(once, settings.audio_files().unwrap());
        }

        #[test]
        fn prop_keybindings_are_stored_lower_case(
            keys in prop::collection::vec("[A-Za-z0-9]{1,5}", 1..4),
        ) {
            let (_dir, settings) = temp_settings();
            let binding = keys.join(" + ");
            settings.set_audio_file_keybinding("/clip.wav", &binding).unwrap();

            let stored = settings.audio_file_keybindings().unwrap();
            prop_assert_eq!(&stored["/clip.wav"], &binding.to_lowercase());
        }
    }
}
