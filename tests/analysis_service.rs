mod common;

use std::collections::HashMap;

use common::{single_file, Call, FakeCatalogs, FakeImporter, FakeRepository, Harness};
use datasource::{
    AnalysisService, BundleError, ImportConfig, ImportStatus, RegistryError, SchemaUpload,
    ServiceError,
};

fn service(harness: &Harness) -> AnalysisService {
    AnalysisService::new(harness.collaborators(), ImportConfig::default())
}

#[test]
fn upload_with_declared_name_and_true_flag() {
    let harness = Harness::new();
    let upload = SchemaUpload {
        overwrite: Some("True".into()),
        parameters: Some(String::new()),
        ..SchemaUpload::new("upload.xml")
    };

    let id = service(&harness)
        .put_mondrian_schema(&br#"<Schema name="Sales"/>"#[..], &upload)
        .expect("import succeeds");

    assert_eq!(id, "Sales");
    let bundles = harness.importer.bundles();
    assert_eq!(bundles.len(), 1);
    let bundle = &bundles[0];
    assert_eq!(bundle.name(), "Sales");
    assert!(bundle.overwrite());
    let parameters = bundle.param("parameters").unwrap();
    assert!(parameters.contains("Provider=mondrian"));
    assert!(parameters.contains("datasourceName=Sales"));
    assert_eq!(bundle.param("domain-id"), Some("Sales"));
}

#[test]
fn unrecognized_document_uses_catalog_name_stem() {
    let harness = Harness::new();
    let upload = SchemaUpload {
        catalog_name: Some("Foo.mondrian".into()),
        ..SchemaUpload::new("whatever.bin")
    };

    let id = service(&harness)
        .put_mondrian_schema(&b"<Cube name=\"c\"/>"[..], &upload)
        .unwrap();

    assert_eq!(id, "Foo");
    assert!(!harness.importer.bundles()[0].overwrite());
}

#[test]
fn parameters_override_explicit_overwrite() {
    let harness = Harness::new();
    let upload = SchemaUpload {
        overwrite: Some("true".into()),
        parameters: Some("Provider=mondrian;overwrite=false".into()),
        ..SchemaUpload::new("upload.xml")
    };

    service(&harness)
        .put_mondrian_schema(&br#"<Schema name="Sales"/>"#[..], &upload)
        .unwrap();

    let bundles = harness.importer.bundles();
    let bundle = &bundles[0];
    assert!(!bundle.overwrite());
    assert_eq!(
        bundle.param("parameters"),
        Some("Provider=mondrian;overwrite=false")
    );
}

#[test]
fn rename_removes_old_catalog_before_import() {
    let harness = Harness::new();
    let upload = SchemaUpload {
        orig_catalog_name: Some("Old".into()),
        overwrite: Some("true".into()),
        ..SchemaUpload::new("schema.xml")
    };

    service(&harness)
        .put_mondrian_schema(&br#"<Schema name="New"/>"#[..], &upload)
        .unwrap();

    assert_eq!(
        harness.calls(),
        vec![
            Call::RemoveCatalog("Old".into()),
            Call::Import("New".into())
        ]
    );
}

#[test]
fn unchanged_name_is_not_removed() {
    let harness = Harness::new();
    let upload = SchemaUpload {
        orig_catalog_name: Some("Sales".into()),
        ..SchemaUpload::new("schema.xml")
    };

    service(&harness)
        .put_mondrian_schema(&br#"<Schema name="Sales"/>"#[..], &upload)
        .unwrap();

    assert_eq!(harness.calls(), vec![Call::Import("Sales".into())]);
}

#[test]
fn empty_orig_name_is_ignored() {
    let harness = Harness::new();
    let upload = SchemaUpload {
        orig_catalog_name: Some(String::new()),
        ..SchemaUpload::new("schema.xml")
    };

    service(&harness)
        .put_mondrian_schema(&br#"<Schema name="Sales"/>"#[..], &upload)
        .unwrap();

    assert_eq!(harness.calls(), vec![Call::Import("Sales".into())]);
}

#[test]
fn failed_removal_aborts_import() {
    let harness = Harness::with(
        FakeCatalogs {
            fail_removal: true,
            ..Default::default()
        },
        FakeRepository::default(),
        FakeImporter::default(),
    );
    let upload = SchemaUpload {
        orig_catalog_name: Some("Old".into()),
        ..SchemaUpload::new("schema.xml")
    };

    let err = service(&harness)
        .put_mondrian_schema(&br#"<Schema name="New"/>"#[..], &upload)
        .unwrap_err();

    assert_eq!(
        err,
        ServiceError::Registry(RegistryError::AccessDenied("Old".into()))
    );
    assert_eq!(harness.calls(), vec![Call::RemoveCatalog("Old".into())]);
    assert!(harness.importer.bundles().is_empty());
}

#[test]
fn unauthorized_caller_touches_nothing() {
    let harness = Harness::new().denied();
    let svc = service(&harness);
    let upload = SchemaUpload {
        catalog_name: Some("Foo".into()),
        orig_catalog_name: Some("Old".into()),
        ..SchemaUpload::new("schema.xml")
    };

    assert_eq!(
        svc.put_mondrian_schema(&b""[..], &upload),
        Err(ServiceError::Unauthorized)
    );
    assert_eq!(svc.remove_analysis("Foo"), Err(ServiceError::Unauthorized));
    assert_eq!(
        svc.analysis_files_for_download("Foo"),
        Err(ServiceError::Unauthorized)
    );
    assert!(harness.calls().is_empty());
}

#[test]
fn pipeline_status_is_propagated() {
    let harness = Harness::with(
        FakeCatalogs::default(),
        FakeRepository::default(),
        FakeImporter {
            reject_with: Some(ImportStatus::ContentExists),
            ..Default::default()
        },
    );

    let err = service(&harness)
        .put_mondrian_schema(
            &br#"<Schema name="Sales"/>"#[..],
            &SchemaUpload::new("upload.xml"),
        )
        .unwrap_err();

    assert_eq!(err.import_status(), Some(ImportStatus::ContentExists));
    assert_eq!(err.import_status().map(ImportStatus::code), Some(9));
}

#[test]
fn empty_upload_edits_stored_schema() {
    let harness = Harness::with(
        FakeCatalogs::default(),
        FakeRepository {
            schemas: HashMap::from([(
                "Foo".to_string(),
                single_file("schema.xml", br#"<Schema name="Foo"/>"#),
            )]),
            ..Default::default()
        },
        FakeImporter::default(),
    );
    let upload = SchemaUpload {
        catalog_name: Some("Foo".into()),
        xmla_enabled: Some("true".into()),
        ..SchemaUpload::new("")
    };

    let id = service(&harness)
        .put_mondrian_schema(&b""[..], &upload)
        .unwrap();

    assert_eq!(id, "Foo");
    assert_eq!(
        harness.calls(),
        vec![Call::SchemaFiles("Foo".into()), Call::Import("Foo".into())]
    );
    let bundles = harness.importer.bundles();
    let bundle = &bundles[0];
    assert_eq!(&bundle.payload()[..], br#"<Schema name="Foo"/>"#);
    assert_eq!(bundle.param("EnableXmla"), Some("true"));
}

#[test]
fn unresolvable_upload_is_rejected_before_pipeline() {
    let harness = Harness::new();
    let err = service(&harness)
        .put_mondrian_schema(&b""[..], &SchemaUpload::new(".xml"))
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Bundle(BundleError::UnresolvedIdentity { .. })
    ));
    assert!(harness.calls().is_empty());
}

#[test]
fn removal_reencodes_slashes() {
    let harness = Harness::new();
    service(&harness).remove_analysis(r"team/sales\eu").unwrap();

    assert_eq!(
        harness.calls(),
        vec![Call::RemoveCatalog("team%2Fsales%5Ceu".into())]
    );
}

#[test]
fn listing_hides_catalogs_with_metadata_counterpart() {
    let harness = Harness::with(
        FakeCatalogs {
            names: vec!["Sales".into(), "Wizard".into(), "Inventory".into()],
            ..Default::default()
        },
        FakeRepository {
            domains: HashMap::from([
                ("Wizard.xmi".to_string(), HashMap::new()),
                ("Sales".to_string(), HashMap::new()),
            ]),
            ..Default::default()
        },
        FakeImporter::default(),
    );
    // Listing has no access check.
    let harness = harness.denied();

    let ids = service(&harness).analysis_datasource_ids().unwrap();
    assert_eq!(ids, vec!["Sales", "Inventory"]);
}

#[test]
fn download_returns_stored_files_or_not_found() {
    let harness = Harness::with(
        FakeCatalogs::default(),
        FakeRepository {
            schemas: HashMap::from([
                (
                    "Sales".to_string(),
                    single_file("schema.xml", b"<Schema name=\"Sales\"/>"),
                ),
                ("Empty".to_string(), HashMap::new()),
            ]),
            ..Default::default()
        },
        FakeImporter::default(),
    );
    let svc = service(&harness);

    let found = svc.analysis_files_for_download("Sales").unwrap();
    assert!(found.contains_key("schema.xml"));

    assert_eq!(
        svc.analysis_files_for_download("Empty"),
        Err(ServiceError::NotFound("Empty".into()))
    );
    assert!(matches!(
        svc.analysis_files_for_download("Missing"),
        Err(ServiceError::Repository(_))
    ));
}
