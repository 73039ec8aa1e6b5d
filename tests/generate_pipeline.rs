// Integration tests for the generate() path: export, namespace fix-up,
// stylesheet rendering and both transform stages, driven through mock
// collaborators. The mock runner plays the external tools, writing the
// output files they are contracted to produce.

use std::path::Path;

use finding_aid::config::{GeneratorConfig, ToolCommands};
use finding_aid::error::FindingAidError;
use finding_aid::export::MockEadExporter;
use finding_aid::indexer::MockSearchIndexer;
use finding_aid::pipeline::FindingAidPipeline;
use finding_aid::properties::{MemoryPropertyStore, STATUS_PROPERTY};
use finding_aid::resource::{ArchivalResource, ROOT_RESOURCE_ID};
use finding_aid::runner::{MockProcessRunner, RunOutput};
use serde_json::json;

const EAD_XML: &str = "<?xml version=\"1.0\"?>\n<ead><eadheader/><archdesc/></ead>";

fn ok_output() -> RunOutput {
    RunOutput {
        exit_code: 0,
        stdout_lines: vec![],
        stderr_lines: vec![],
    }
}

fn config_in(dir: &Path) -> GeneratorConfig {
    let config = GeneratorConfig {
        downloads_dir: dir.join("downloads"),
        cache_dir: dir.join("cache"),
        template_dir: dir.join("templates"),
        cache_enabled: true,
        app_root: "/srv/app".into(),
        format: None,
        model: None,
        tools: ToolCommands::default(),
    };
    std::fs::create_dir_all(&config.template_dir).unwrap();
    std::fs::write(
        config.template_dir.join("ead-pdf-inventory-summary.xsl"),
        "<xsl:stylesheet><img src=\"{{app-root}}/logo.png\"/></xsl:stylesheet>",
    )
    .unwrap();
    config
}

fn exporter_returning_ead() -> MockEadExporter {
    let mut exporter = MockEadExporter::new();
    exporter
        .expect_export()
        .returning(|_| Ok(EAD_XML.to_string()));
    exporter
}

#[tokio::test]
async fn successful_generate_places_artifact_and_records_status() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let exporter = exporter_returning_ead();
    let properties = MemoryPropertyStore::new();

    let mut runner = MockProcessRunner::new();
    // XSLT stage: consumes the namespace-fixed EAD, emits the FO document.
    runner
        .expect_run()
        .withf(|command, args| command == "saxon" && args.len() == 3)
        .times(1)
        .returning(|_, args| {
            let source = std::fs::read_to_string(&args[1]).unwrap();
            assert!(source.contains("urn:isbn:1-931666-22-9"));
            let stylesheet = std::fs::read_to_string(&args[0]).unwrap();
            assert!(stylesheet.contains("/srv/app/logo.png"));
            std::fs::write(&args[2], "<fo:root/>").unwrap();
            Ok(ok_output())
        });
    // FO stage: renders the artifact at the requested output path.
    runner
        .expect_run()
        .withf(|command, args| command == "fop" && args[0] == "-pdf")
        .times(1)
        .returning(|_, args| {
            std::fs::write(&args[2], b"%PDF-1.4 finding aid").unwrap();
            Ok(ok_output())
        });

    let mut indexer = MockSearchIndexer::new();
    indexer
        .expect_partial_update()
        .withf(|id, payload| {
            *id == 42 && *payload == json!({ "findingAid": { "status": "Generated" } })
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let pipeline = FindingAidPipeline::new(
        ArchivalResource::new(42, None),
        &config,
        &exporter,
        &runner,
        &properties,
        &indexer,
    )
    .unwrap();

    let artifact = pipeline.generate().await.unwrap();

    assert_eq!(artifact, config.downloads_dir.join("42.pdf"));
    assert!(artifact.is_file());
    assert_eq!(
        properties.get(42, STATUS_PROPERTY, None).unwrap().value,
        "Generated"
    );
    // The export was cached for the next run.
    assert!(config.cache_dir.join("ead-42.xml").is_file());
}

#[tokio::test]
async fn fo_render_failure_reports_soft_failure_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let exporter = exporter_returning_ead();
    let properties = MemoryPropertyStore::new();

    let mut runner = MockProcessRunner::new();
    runner
        .expect_run()
        .withf(|command, _| command == "saxon")
        .times(1)
        .returning(|_, args| {
            std::fs::write(&args[2], "<fo:root/>").unwrap();
            Ok(ok_output())
        });
    runner
        .expect_run()
        .withf(|command, _| command == "fop")
        .times(1)
        .returning(|_, _| {
            Ok(RunOutput {
                exit_code: 1,
                stdout_lines: vec![],
                stderr_lines: vec!["[FATAL] invalid FO".into()],
            })
        });

    let mut indexer = MockSearchIndexer::new();
    indexer.expect_partial_update().times(0);

    let pipeline = FindingAidPipeline::new(
        ArchivalResource::new(42, None),
        &config,
        &exporter,
        &runner,
        &properties,
        &indexer,
    )
    .unwrap();

    let err = pipeline.generate().await.unwrap_err();
    assert!(matches!(
        err,
        FindingAidError::RenderFailed { tool: "FOP" }
    ));
    // Status untouched, no artifact written.
    assert!(properties.get(42, STATUS_PROPERTY, None).is_none());
    assert!(!config.downloads_dir.join("42.pdf").exists());
}

#[tokio::test]
async fn xslt_failure_is_fatal_and_carries_the_captured_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let exporter = exporter_returning_ead();
    let properties = MemoryPropertyStore::new();

    let mut runner = MockProcessRunner::new();
    runner
        .expect_run()
        .withf(|command, _| command == "saxon")
        .times(1)
        .returning(|_, _| {
            Ok(RunOutput {
                exit_code: 2,
                stdout_lines: vec!["Error on line 14".into()],
                stderr_lines: vec!["SXXP0003".into()],
            })
        });

    let mut indexer = MockSearchIndexer::new();
    indexer.expect_partial_update().times(0);

    let pipeline = FindingAidPipeline::new(
        ArchivalResource::new(42, None),
        &config,
        &exporter,
        &runner,
        &properties,
        &indexer,
    )
    .unwrap();

    match pipeline.generate().await.unwrap_err() {
        FindingAidError::TransformFailed {
            tool,
            exit_code,
            output,
        } => {
            assert_eq!(tool, "SAXON");
            assert_eq!(exit_code, 2);
            assert_eq!(output, vec!["Error on line 14", "SXXP0003"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(properties.get(42, STATUS_PROPERTY, None).is_none());
}

#[tokio::test]
async fn slugged_rtf_generate_uses_the_slug_and_format() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.format = Some("rtf".parse().unwrap());
    let exporter = exporter_returning_ead();
    let properties = MemoryPropertyStore::new();

    let mut runner = MockProcessRunner::new();
    runner
        .expect_run()
        .withf(|command, _| command == "saxon")
        .times(1)
        .returning(|_, args| {
            std::fs::write(&args[2], "<fo:root/>").unwrap();
            Ok(ok_output())
        });
    runner
        .expect_run()
        .withf(|command, args| {
            command == "fop" && args[0] == "-rtf" && args[2].ends_with("fonds-aurelia.rtf")
        })
        .times(1)
        .returning(|_, args| {
            std::fs::write(&args[2], b"{\\rtf1}").unwrap();
            Ok(ok_output())
        });

    let mut indexer = MockSearchIndexer::new();
    indexer
        .expect_partial_update()
        .times(1)
        .returning(|_, _| Ok(()));

    let pipeline = FindingAidPipeline::new(
        ArchivalResource::new(42, Some("fonds-aurelia".into())),
        &config,
        &exporter,
        &runner,
        &properties,
        &indexer,
    )
    .unwrap();

    let artifact = pipeline.generate().await.unwrap();
    assert_eq!(artifact, config.downloads_dir.join("fonds-aurelia.rtf"));
    assert!(artifact.is_file());
}

#[tokio::test]
async fn root_resource_is_rejected_at_construction_with_no_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let mut exporter = MockEadExporter::new();
    exporter.expect_export().times(0);
    let mut runner = MockProcessRunner::new();
    runner.expect_run().times(0);
    let properties = MemoryPropertyStore::new();
    let mut indexer = MockSearchIndexer::new();
    indexer.expect_partial_update().times(0);

    let result = FindingAidPipeline::new(
        ArchivalResource::new(ROOT_RESOURCE_ID, None),
        &config,
        &exporter,
        &runner,
        &properties,
        &indexer,
    );

    assert!(matches!(
        result.err(),
        Some(FindingAidError::RootResource(1))
    ));
    assert!(properties.all().is_empty());
    assert!(!config.downloads_dir.exists());
    assert!(!config.cache_dir.exists());
}
