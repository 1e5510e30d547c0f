//! Behavior every storage variant shares, run against each fixture.

use super::Fixture;
use dust_core::{ContentFile, OpenMode, Storage, StorageError, TransportError};

pub async fn delete<S: Storage>(fx: Fixture<S>) {
    fx.create_file("test.txt", "test");
    assert!(fx.has_file("test.txt"));
    fx.storage.delete("test.txt").await.unwrap();
    for host in &fx.hosts {
        assert!(!host.has_file("test.txt"));
    }
}

pub async fn delete_non_existing<S: Storage>(fx: Fixture<S>) {
    fx.storage.delete("test.txt").await.unwrap();
    assert!(!fx.has_file("test.txt"));
    assert!(fx.log().contains("DELETE on missing file"));
}

pub async fn delete_readonly<S: Storage>(fx: Fixture<S>) {
    fx.create_file("test.txt", "test");
    fx.primary().set_readonly(true);
    let error = fx.storage.delete("test.txt").await.unwrap_err();
    assert!(matches!(
        error,
        StorageError::Transport {
            source: TransportError::HttpStatus(403),
            ..
        }
    ));
    assert!(fx.log().contains("Failed to delete"));
    assert!(fx.primary().has_file("test.txt"));
    if let Some(mirror) = &fx.mirror {
        assert!(mirror.path().join("test.txt").exists());
    }
}

pub async fn delete_dilettante<S: Storage>(fx: Fixture<S>) {
    fx.primary().set_override_code(202);
    fx.create_file("test.txt", "test");
    let error = fx.storage.delete("test.txt").await.unwrap_err();
    assert!(matches!(
        error,
        StorageError::UnexpectedStatusCode { status: 202, .. }
    ));
    assert!(fx.log().contains("Failed to delete"));
}

pub async fn exists<S: Storage>(fx: Fixture<S>) {
    fx.create_file("test.txt", "test");
    assert!(fx.storage.exists("test.txt").await.unwrap());
    fx.delete_file("test.txt");
    assert!(!fx.storage.exists("test.txt").await.unwrap());
}

pub async fn get_available_name<S: Storage>(fx: Fixture<S>) {
    assert_eq!(
        fx.storage.get_available_name("test.txt").await.unwrap(),
        "test.txt"
    );
}

pub async fn get_available_name_existing<S: Storage>(fx: Fixture<S>) {
    fx.create_file("test.txt", "test");
    assert_eq!(
        fx.storage.get_available_name("test.txt").await.unwrap(),
        "test_1.txt"
    );
}

pub async fn get_valid_name<S: Storage>(fx: Fixture<S>) {
    assert_eq!(fx.storage.get_valid_name("test.txt").unwrap(), "test.txt");
}

pub async fn open<S: Storage>(fx: Fixture<S>) {
    fx.create_file("test.txt", "test");
    let file = fx.storage.open("test.txt").await.unwrap();
    assert_eq!(file.read(), b"test");
    assert_eq!(file.name(), "test.txt");
}

pub async fn open_missing<S: Storage>(fx: Fixture<S>) {
    let error = fx.storage.open("test.txt").await.unwrap_err();
    assert!(matches!(error, StorageError::FileNotFound(_)));
    assert!(!fx.log().contains("Failed to download"));
}

pub async fn open_only_for_read<S: Storage>(fx: Fixture<S>) {
    fx.create_file("test.txt", "test");
    fx.storage
        .open_with_mode("test.txt", "rb".parse().unwrap())
        .await
        .unwrap();
    let error = fx
        .storage
        .open_with_mode("test.txt", OpenMode::Write)
        .await
        .unwrap_err();
    assert!(matches!(error, StorageError::InvalidOpenMode(_)));
}

pub async fn save<S: Storage>(fx: Fixture<S>) {
    let name = fx
        .storage
        .save("test.txt", ContentFile::from("test"))
        .await
        .unwrap();
    assert_eq!(name, "test.txt");
    for host in &fx.hosts {
        assert_eq!(host.get_file("test.txt").as_deref(), Some("test"));
    }
}

pub async fn save_existing<S: Storage>(fx: Fixture<S>) {
    fx.storage
        .save("test.txt", ContentFile::from("test"))
        .await
        .unwrap();
    let name = fx
        .storage
        .save("test.txt", ContentFile::from("test2"))
        .await
        .unwrap();
    assert_eq!(name, "test_1.txt");
    assert_eq!(fx.get_file("test_1.txt").as_deref(), Some("test2"));
    assert_eq!(fx.get_file("test.txt").as_deref(), Some("test"));

    let name = fx
        .storage
        .save("test.txt", ContentFile::from("test3"))
        .await
        .unwrap();
    assert_eq!(name, "test_2.txt");
}

pub async fn save_readonly<S: Storage>(fx: Fixture<S>) {
    fx.primary().set_readonly(true);
    let error = fx
        .storage
        .save("test.txt", ContentFile::from("test"))
        .await
        .unwrap_err();
    assert_eq!(error.status_code(), Some(403));
    assert!(fx.log().contains("Failed to create"));
}

/// The 202 is first seen while probing for a free name.
pub async fn save_dilettante<S: Storage>(fx: Fixture<S>) {
    fx.primary().set_override_code(202);
    let error = fx
        .storage
        .save("test.txt", ContentFile::from("test"))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        StorageError::UnexpectedStatusCode { status: 202, .. }
    ));
    assert!(fx.log().contains("Failed to check"));
}

pub async fn save_as_dilettante<S: Storage>(fx: Fixture<S>) {
    fx.primary().set_override_code(202);
    let error = fx
        .storage
        .save_as("test.txt", ContentFile::from("test"))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        StorageError::UnexpectedStatusCode { status: 202, .. }
    ));
    assert!(fx.log().contains("Failed to create"));
}

pub async fn size<S: Storage>(fx: Fixture<S>) {
    fx.create_file("test.txt", "test");
    assert_eq!(fx.storage.size("test.txt").await.unwrap(), 4);
}

pub async fn url<S: Storage>(fx: Fixture<S>) {
    fx.create_file("test.txt", "test");
    assert_eq!(
        fx.storage.url("test.txt"),
        "http://media.example.com/test.txt"
    );
}

/// Generates one test per shared scenario for a fixture constructor.
#[macro_export]
macro_rules! storage_contract_tests {
    (@scenarios $fixture:expr; $($scenario:ident),+ $(,)?) => {
        $(
            #[tokio::test]
            async fn $scenario() {
                $crate::common::contract::$scenario($fixture.await).await;
            }
        )+
    };
    ($fixture:expr) => {
        $crate::storage_contract_tests!(
            @scenarios $fixture;
            delete,
            delete_non_existing,
            delete_readonly,
            delete_dilettante,
            exists,
            get_available_name,
            get_available_name_existing,
            get_valid_name,
            open,
            open_missing,
            open_only_for_read,
            save,
            save_existing,
            save_readonly,
            save_dilettante,
            save_as_dilettante,
            size,
            url
        );
    };
}
