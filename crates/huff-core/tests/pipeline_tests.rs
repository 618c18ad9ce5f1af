//! End-to-end page load scenarios
//!
//! Each test drives a response through the observer context, the notice
//! channel, injection and rendering, with a stub conversion engine.

use async_trait::async_trait;
use huff_core::{
    ConversionEngine, ConversionResult, HtmlPage, HuffConfig, HuffError, LoadedTab, MemoryStore,
    NoResources, ObservationOutcome, Page, PipelineState, PreferenceStore, PreferencesCarrier,
    ReadinessGate, ResponseDetails, ResponseHeader, Result, Runtime, StoredPreferences,
    StylesheetChoice, Tab, TabId, TabQuery, TabStatus,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PAGE_URL: &str = "https://fhir.example.org/r4/Patient/123";
const RAW_JSON: &str = r#"{"resourceType":"Patient","id":"123"}"#;

/// Mapping each conversion ran with; `None` for the default table
type ConversionLog = Arc<Mutex<Vec<Option<String>>>>;

/// Engine answering every conversion with a fixed encoded result
struct StubEngine {
    response: String,
    log: ConversionLog,
}

impl StubEngine {
    fn returning(result: ConversionResult) -> Self {
        Self {
            response: result.to_json(),
            log: ConversionLog::default(),
        }
    }

    fn log(&self) -> ConversionLog {
        self.log.clone()
    }

    fn yaml(yaml: &str) -> Self {
        Self::returning(ConversionResult::Success {
            yaml: yaml.to_string(),
        })
    }
}

#[async_trait]
impl ConversionEngine for StubEngine {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn convert(&self, _raw: &str) -> String {
        self.log.lock().unwrap().push(None);
        self.response.clone()
    }

    async fn convert_with_mapping(&self, _raw: &str, mapping: &str) -> String {
        self.log.lock().unwrap().push(Some(mapping.to_string()));
        self.response.clone()
    }

    async fn default_mapping(&self) -> Result<String> {
        Ok(String::new())
    }
}

/// Engine that converts `{"fail":...}` documents into failures
struct SelectiveEngine;

#[async_trait]
impl ConversionEngine for SelectiveEngine {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn convert(&self, raw: &str) -> String {
        let result = if raw.contains("\"fail\"") {
            ConversionResult::Failure {
                error: "parse error".to_string(),
            }
        } else {
            ConversionResult::Success {
                yaml: "resourceType: Patient\n".to_string(),
            }
        };
        result.to_json()
    }

    async fn convert_with_mapping(&self, raw: &str, _mapping: &str) -> String {
        self.convert(raw).await
    }

    async fn default_mapping(&self) -> Result<String> {
        Ok(String::new())
    }
}

struct BrokenEngine;

#[async_trait]
impl ConversionEngine for BrokenEngine {
    async fn initialize(&self) -> Result<()> {
        Err(HuffError::engine_error("engine module missing"))
    }

    async fn convert(&self, _raw: &str) -> String {
        unreachable!("conversion must not run before initialization")
    }

    async fn convert_with_mapping(&self, _raw: &str, _mapping: &str) -> String {
        unreachable!("conversion must not run before initialization")
    }

    async fn default_mapping(&self) -> Result<String> {
        Err(HuffError::engine_error("engine module missing"))
    }
}

struct LoadingForever;

#[async_trait]
impl TabQuery for LoadingForever {
    async fn active_tab(&self) -> Result<Option<Tab>> {
        Ok(Some(Tab {
            id: TabId(1),
            status: TabStatus::Loading,
            url: Some(PAGE_URL.to_string()),
        }))
    }
}

fn runtime(store: MemoryStore, engine: impl ConversionEngine + 'static) -> Runtime {
    Runtime::new(
        Arc::new(store),
        Arc::new(NoResources),
        Arc::new(engine),
        &HuffConfig::default(),
    )
    .with_gate(ReadinessGate::new(Duration::from_millis(1), Some(20)))
}

fn fhir_response(content_type: &str) -> ResponseDetails {
    ResponseDetails::main_frame(
        PAGE_URL,
        vec![ResponseHeader::new("Content-Type", content_type)],
    )
    .with_tab(TabId(1))
}

fn loaded_tab() -> Arc<dyn TabQuery> {
    Arc::new(LoadedTab::new(TabId(1), Some(PAGE_URL.to_string())))
}

fn raw_page(text: &str) -> HtmlPage {
    HtmlPage::from_raw_text(text).with_url(PAGE_URL)
}

#[tokio::test]
async fn test_fhir_json_page_is_rendered() {
    let runtime = runtime(MemoryStore::new(), StubEngine::yaml("resourceType: Patient\n"));

    let (page, report) = runtime
        .load_page(
            raw_page(RAW_JSON),
            &fhir_response("application/fhir+json; charset=utf-8"),
            loaded_tab(),
        )
        .await
        .unwrap();

    assert_eq!(report.final_state(), PipelineState::Done);
    assert!(report.states.contains(&PipelineState::Rendering));
    match &report.observation {
        ObservationOutcome::Notified {
            content_type,
            report,
        } => {
            assert_eq!(content_type, "application/fhir+json; charset=utf-8");
            assert!(report.delivered);
        }
        other => panic!("unexpected observation: {other:?}"),
    }

    let html = page.element_html(0).unwrap();
    assert!(html.starts_with(r#"<code class="language-yaml">"#));
    assert!(html.contains("resourceType"));
    assert!(html.contains("Patient"));
    assert_eq!(report.render.unwrap().rendered, vec![0]);
}

#[tokio::test]
async fn test_default_mapping_table_without_custom_mappings() {
    let engine = StubEngine::yaml("resourceType: Patient\n");
    let log = engine.log();
    let store = MemoryStore::with_values(StoredPreferences {
        custom_mappings: Some("  \n".to_string()),
        ..Default::default()
    });

    runtime(store, engine)
        .load_page(
            raw_page(RAW_JSON),
            &fhir_response("application/fhir+json"),
            loaded_tab(),
        )
        .await
        .unwrap();

    assert_eq!(*log.lock().unwrap(), vec![None]);
}

#[tokio::test]
async fn test_custom_mappings_reach_the_engine() {
    let engine = StubEngine::yaml("resourceType: Patient\n");
    let log = engine.log();
    let store = MemoryStore::with_values(StoredPreferences {
        custom_mappings: Some("Coding: code | display".to_string()),
        ..Default::default()
    });
    let page = HtmlPage::parse(concat!(
        "<html><head></head><body>",
        "<pre>{\"resourceType\":\"Patient\"}</pre>",
        "<pre>{\"resourceType\":\"Observation\"}</pre>",
        "</body></html>"
    ))
    .with_url(PAGE_URL);

    let (_, report) = runtime(store, engine)
        .load_page(page, &fhir_response("application/fhir+json"), loaded_tab())
        .await
        .unwrap();

    assert_eq!(report.render.unwrap().rendered, vec![0, 1]);
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            Some("Coding: code | display".to_string()),
            Some("Coding: code | display".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_injection_attaches_carrier_module_and_default_theme() {
    let runtime = runtime(MemoryStore::new(), StubEngine::yaml("id: x\n"));

    let (page, report) = runtime
        .load_page(
            raw_page(RAW_JSON),
            &fhir_response("application/fhir+json"),
            loaded_tab(),
        )
        .await
        .unwrap();

    let injection = report.injection.unwrap();
    assert!(injection.carrier_written);
    assert!(injection.module_attached);
    assert_eq!(injection.stylesheet, StylesheetChoice::Default);

    let html = page.to_html();
    assert!(html.contains(r#"id="extPrefs""#));
    assert!(html.contains("dark.min.css"));
    assert!(!html.contains("<style>"));
    assert_eq!(
        PreferencesCarrier::read_from(&page).unwrap(),
        injection.preferences
    );
}

#[tokio::test]
async fn test_custom_css_replaces_default_theme() {
    let store = MemoryStore::with_values(StoredPreferences {
        custom_css_styles: Some(".hl-entity { color: teal; }".to_string()),
        ..Default::default()
    });
    let runtime = runtime(store, StubEngine::yaml("id: x\n"));

    let (page, report) = runtime
        .load_page(
            raw_page(RAW_JSON),
            &fhir_response("application/fhir+json"),
            loaded_tab(),
        )
        .await
        .unwrap();

    assert_eq!(
        report.injection.unwrap().stylesheet,
        StylesheetChoice::Custom
    );
    assert_eq!(
        page.head_additions(),
        &["<style>.hl-entity { color: teal; }</style>".to_string()]
    );
}

#[tokio::test]
async fn test_conversion_failure_leaves_element_unchanged() {
    let runtime = runtime(
        MemoryStore::new(),
        StubEngine::returning(ConversionResult::Failure {
            error: "parse error".to_string(),
        }),
    );
    let original = raw_page(RAW_JSON);
    let original_inner = original.element_html(0).unwrap().to_string();

    let (page, report) = runtime
        .load_page(original, &fhir_response("application/fhir+json"), loaded_tab())
        .await
        .unwrap();

    assert_eq!(page.element_html(0).unwrap(), original_inner);
    let render = report.render.as_ref().unwrap();
    assert!(render.rendered.is_empty());
    assert_eq!(render.failed, vec![(0, "parse error".to_string())]);
    assert_eq!(report.final_state(), PipelineState::Done);
}

#[tokio::test]
async fn test_elements_render_independently() {
    let runtime = runtime(MemoryStore::new(), SelectiveEngine);
    let page = HtmlPage::parse(concat!(
        "<html><head></head><body>",
        "<pre>{\"resourceType\":\"Patient\"}</pre>",
        "<pre>{\"fail\":true}</pre>",
        "<pre>{\"resourceType\":\"Patient\"}</pre>",
        "</body></html>"
    ))
    .with_url(PAGE_URL);

    let (page, report) = runtime
        .load_page(page, &fhir_response("application/fhir+json"), loaded_tab())
        .await
        .unwrap();

    let render = report.render.unwrap();
    assert_eq!(render.rendered, vec![0, 2]);
    assert_eq!(render.failed.len(), 1);
    assert_eq!(page.element_html(1).unwrap(), "{\"fail\":true}");
    assert!(page.element_html(2).unwrap().contains("language-yaml"));
}

#[tokio::test]
async fn test_postprocessing_off_inserts_yaml_verbatim() {
    let yaml = "subject: Reference(Patient/1)\nurl: http://hl7.org/fhir\n";
    let store = MemoryStore::with_values(StoredPreferences {
        highlight_huff: Some(false),
        make_links_clickable: Some(false),
        make_references_clickable: Some(false),
        ..Default::default()
    });
    let runtime = runtime(store, StubEngine::yaml(yaml));

    let (page, report) = runtime
        .load_page(
            raw_page(RAW_JSON),
            &fhir_response("application/fhir+json"),
            loaded_tab(),
        )
        .await
        .unwrap();

    assert_eq!(
        page.element_html(0).unwrap(),
        format!(r#"<code class="language-yaml">{yaml}</code>"#)
    );
    assert_eq!(
        report.injection.unwrap().stylesheet,
        StylesheetChoice::None
    );
}

#[tokio::test]
async fn test_links_and_references_resolve_against_page_url() {
    let yaml = "meta:\n  source: https://registry.example.org/\nsubject: Reference(Patient/123)\n";
    let runtime = runtime(MemoryStore::new(), StubEngine::yaml(yaml));

    let (page, _) = runtime
        .load_page(
            raw_page(RAW_JSON),
            &fhir_response("application/fhir+json"),
            loaded_tab(),
        )
        .await
        .unwrap();

    let html = page.element_html(0).unwrap();
    assert!(html.contains(
        r#"<a href="https://registry.example.org/">https://registry.example.org/</a>"#
    ));
    assert!(html.contains(
        r#"<a href="https://fhir.example.org/r4/Patient/123">Patient/123</a>"#
    ));
    assert_eq!(html.matches("<a ").count(), 2);
}

#[tokio::test]
async fn test_non_fhir_response_is_skipped() {
    let engine = StubEngine::yaml("id: x\n");
    let runtime = runtime(MemoryStore::new(), engine);
    let original = raw_page(RAW_JSON).to_html();

    let (page, report) = runtime
        .load_page(
            raw_page(RAW_JSON),
            &fhir_response("application/json"),
            loaded_tab(),
        )
        .await
        .unwrap();

    assert_eq!(report.final_state(), PipelineState::Skipped);
    assert!(report.injection.is_none());
    assert_eq!(page.to_html(), original);
}

#[tokio::test]
async fn test_configured_content_types_are_honoured() {
    let store = MemoryStore::new();
    store
        .set(StoredPreferences {
            handle_content_types: Some("application/json\n\n".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let runtime = runtime(store, StubEngine::yaml("id: x\n"));

    let (_, report) = runtime
        .load_page(
            raw_page(RAW_JSON),
            &fhir_response("application/json; charset=utf-8"),
            loaded_tab(),
        )
        .await
        .unwrap();

    assert_eq!(report.final_state(), PipelineState::Done);
}

#[tokio::test]
async fn test_page_that_never_loads() {
    let runtime = runtime(MemoryStore::new(), StubEngine::yaml("id: x\n"));
    let original = raw_page(RAW_JSON).to_html();

    let (page, report) = runtime
        .load_page(
            raw_page(RAW_JSON),
            &fhir_response("application/fhir+json"),
            Arc::new(LoadingForever),
        )
        .await
        .unwrap();

    assert_eq!(report.final_state(), PipelineState::NeverReady);
    assert_eq!(
        report.observation,
        ObservationOutcome::NeverReady { attempts: 20 }
    );
    assert_eq!(page.to_html(), original);
}

#[tokio::test]
async fn test_engine_initialization_failure_renders_nothing() {
    let runtime = runtime(MemoryStore::new(), BrokenEngine);
    let original = raw_page(RAW_JSON);
    let original_inner = original.element_html(0).unwrap().to_string();

    let (page, report) = runtime
        .load_page(original, &fhir_response("application/fhir+json"), loaded_tab())
        .await
        .unwrap();

    assert!(report.injection.is_some());
    assert!(report.render.is_none());
    assert!(!report.states.contains(&PipelineState::Rendering));
    assert_eq!(page.element_html(0).unwrap(), original_inner);
}

#[tokio::test]
async fn test_sub_resources_never_match() {
    let runtime = runtime(MemoryStore::new(), StubEngine::yaml("id: x\n"));
    let mut details = fhir_response("application/fhir+json");
    details.resource_type = huff_core::ResourceType::Xmlhttprequest;

    let (page, report) = runtime
        .load_page(raw_page(RAW_JSON), &details, loaded_tab())
        .await
        .unwrap();

    assert_eq!(report.final_state(), PipelineState::Skipped);
    assert!(!page.has_module(huff_core::RENDER_MODULE));
}
