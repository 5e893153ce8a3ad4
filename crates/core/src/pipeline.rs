//! The document-to-deck pipeline.
//!
//! Page text comes from a [`PageSource`], topics and bullet content from a
//! [`TextGenerator`], and the finished deck goes to a [`DeckWriter`]. The
//! pipeline owns only the orchestration: cleaning, deduplication, subject
//! detection, quality filtering and assembly of the [`PresentationSpec`].
//! Progress is reported through a [`PipelineObserver`].

use crate::bullets::{fallback_bullet, BulletFilter};
use crate::config::{DeckConfig, GenerationParams};
use crate::error::{Error, Result};
use crate::normalize::clean_response_lines;
use crate::prompts::{content_prompt, topic_prompt};
use crate::render::{DeckWriter, PresentationRenderer};
use crate::subject::{classify_subject, SubjectArea};
use crate::topics::TopicDeduplicator;
use crate::types::{PresentationSpec, Section};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SUBTITLE: &str = "Generated from PDF Analysis";
pub const DEFAULT_CALL_TO_ACTION: &str = "Questions and Discussion";

/// Slides added to the section count when sizing the deck.
const EXTRA_SLIDES: usize = 4;

/// Supplies the text of a document, one string per page.
pub trait PageSource {
    fn pages(&self) -> Result<Vec<String>>;
}

/// One call to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub params: GenerationParams,
}

/// A generative-text service.
pub trait TextGenerator {
    /// Send a prompt and return the raw response text.
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Progress and diagnostics emitted while the pipeline runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A page produced `topics` topics. Pages are numbered from 1.
    PageProcessed {
        page: usize,
        total: usize,
        topics: usize,
    },
    /// A page had no text and was not sent.
    PageSkipped { page: usize },
    /// Topic extraction for a page failed.
    PageFailed { page: usize, message: String },
    TopicsDeduplicated { before: usize, after: usize },
    SubjectDetected { subject: SubjectArea },
    /// Content generation for a topic failed.
    TopicFailed { topic: String, message: String },
    /// A topic produced too few usable bullets and was dropped.
    InsufficientContent { topic: String, bullets: usize },
    SectionGenerated {
        topic: String,
        model: String,
        bullets: usize,
    },
    DeckSaved { path: PathBuf, slides: usize },
}

/// Receives [`PipelineEvent`]s.
pub trait PipelineObserver {
    fn on_event(&self, event: &PipelineEvent);
}

/// Observer that writes every event to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::PageProcessed { page, total, topics } => {
                log::info!("page processed page={}/{} topics={}", page, total, topics)
            }
            PipelineEvent::PageSkipped { page } => log::debug!("page skipped page={}", page),
            PipelineEvent::PageFailed { page, message } => {
                log::warn!("page failed page={} error={:?}", page, message)
            }
            PipelineEvent::TopicsDeduplicated { before, after } => {
                log::info!("topics deduplicated before={} after={}", before, after)
            }
            PipelineEvent::SubjectDetected { subject } => {
                log::info!("subject detected subject={:?}", subject.label())
            }
            PipelineEvent::TopicFailed { topic, message } => {
                log::warn!("topic failed topic={:?} error={:?}", topic, message)
            }
            PipelineEvent::InsufficientContent { topic, bullets } => {
                log::warn!("insufficient content topic={:?} bullets={}", topic, bullets)
            }
            PipelineEvent::SectionGenerated {
                topic,
                model,
                bullets,
            } => log::info!(
                "section generated topic={:?} model={} bullets={}",
                topic,
                model,
                bullets
            ),
            PipelineEvent::DeckSaved { path, slides } => {
                log::info!("deck saved path={} slides={}", path.display(), slides)
            }
        }
    }
}

/// Result of [`ContentPipeline::build_spec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub spec: PresentationSpec,
    pub subject: SubjectArea,
    /// Topics left after deduplication.
    pub topic_count: usize,
}

/// Result of a full [`ContentPipeline::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub path: PathBuf,
    pub slide_count: usize,
    pub section_count: usize,
    pub subject: SubjectArea,
}

/// File name for a finished deck: `{subject}_presentation.pptx`, or
/// `{subject}_{template}_presentation.pptx` when a user template is in use.
pub fn output_file_name(subject: SubjectArea, template: Option<&str>) -> String {
    let template = template.map(template_slug).filter(|slug| !slug.is_empty());
    match template {
        Some(slug) => format!("{}_{}_presentation.pptx", subject.slug(), slug),
        None => format!("{}_presentation.pptx", subject.slug()),
    }
}

/// Lowercase file-name form of a template name, without its extension.
fn template_slug(name: &str) -> String {
    let name = name.trim();
    let stem = match name.len().checked_sub(5) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pptx") => {
            &name[..cut]
        }
        _ => name,
    };

    stem.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-') || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

/// Turns a document into a presentation.
pub struct ContentPipeline {
    config: DeckConfig,
    observer: Box<dyn PipelineObserver>,
}

impl Default for ContentPipeline {
    fn default() -> Self {
        Self::new(DeckConfig::default())
    }
}

impl ContentPipeline {
    /// Create a pipeline that logs its progress.
    pub fn new(config: DeckConfig) -> Self {
        Self {
            config,
            observer: Box::new(LogObserver),
        }
    }

    /// Replace the observer receiving progress events.
    pub fn with_observer(mut self, observer: impl PipelineObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    fn emit(&self, event: PipelineEvent) {
        self.observer.on_event(&event);
    }

    /// Model used for the topic at `index`, rotating through the list.
    fn content_model(&self, index: usize) -> &str {
        let models = &self.config.content_models;
        if models.is_empty() {
            &self.config.topic_model
        } else {
            &models[index % models.len()]
        }
    }

    /// Extract topics from every non-blank page, in page order.
    fn extract_topics<G>(&self, pages: &[String], generator: &G) -> Vec<String>
    where
        G: TextGenerator + ?Sized,
    {
        let total = pages.len();
        let mut topics = Vec::new();

        for (idx, page) in pages.iter().enumerate() {
            let page_no = idx + 1;
            if page.trim().is_empty() {
                self.emit(PipelineEvent::PageSkipped { page: page_no });
                continue;
            }

            let request = GenerationRequest {
                model: self.config.topic_model.clone(),
                prompt: topic_prompt(page),
                params: self.config.topic_params.clone(),
            };

            match generator.generate(&request) {
                Ok(response) => {
                    let page_topics = clean_response_lines(&response);
                    self.emit(PipelineEvent::PageProcessed {
                        page: page_no,
                        total,
                        topics: page_topics.len(),
                    });
                    topics.extend(page_topics);
                }
                Err(e) => self.emit(PipelineEvent::PageFailed {
                    page: page_no,
                    message: e.to_string(),
                }),
            }

            pause(self.config.page_delay());
        }

        topics
    }

    /// Generate and filter the bullets for each topic.
    fn generate_sections<G>(
        &self,
        topics: &[String],
        subject: SubjectArea,
        generator: &G,
    ) -> Vec<Section>
    where
        G: TextGenerator + ?Sized,
    {
        let filter = BulletFilter::from_config(&self.config);
        let mut sections = Vec::new();

        for (idx, topic) in topics.iter().enumerate() {
            let model = self.content_model(idx).to_string();
            let request = GenerationRequest {
                model: model.clone(),
                prompt: content_prompt(topic, subject),
                params: self.config.content_params.clone(),
            };

            let bullets = match generator.generate(&request) {
                Ok(response) => filter.select(&clean_response_lines(&response)),
                Err(e) => {
                    self.emit(PipelineEvent::TopicFailed {
                        topic: topic.clone(),
                        message: e.to_string(),
                    });
                    if self.config.fallback_on_failure {
                        sections.push(Section::new(topic.clone(), vec![fallback_bullet(topic)]));
                    }
                    pause(self.config.topic_delay());
                    continue;
                }
            };

            if bullets.len() >= self.config.min_section_bullets {
                self.emit(PipelineEvent::SectionGenerated {
                    topic: topic.clone(),
                    model,
                    bullets: bullets.len(),
                });
                sections.push(Section::new(topic.clone(), bullets));
            } else {
                self.emit(PipelineEvent::InsufficientContent {
                    topic: topic.clone(),
                    bullets: bullets.len(),
                });
            }

            pause(self.config.topic_delay());
        }

        sections
    }

    /// Build the presentation spec for a document.
    ///
    /// Fails with [`Error::NoTopics`] when no page yields a topic and with
    /// [`Error::NoUsableSections`] when every topic is dropped. Upstream
    /// failures on single pages or topics are reported and skipped.
    pub fn build_spec<S, G>(&self, source: &S, generator: &G) -> Result<PipelineOutput>
    where
        S: PageSource + ?Sized,
        G: TextGenerator + ?Sized,
    {
        let pages = source.pages()?;
        log::info!("Processing {} pages", pages.len());

        let raw_topics = self.extract_topics(&pages, generator);
        if raw_topics.is_empty() {
            return Err(Error::NoTopics);
        }

        let topics = TopicDeduplicator::from_config(&self.config).dedupe(&raw_topics);
        self.emit(PipelineEvent::TopicsDeduplicated {
            before: raw_topics.len(),
            after: topics.len(),
        });
        if topics.is_empty() {
            return Err(Error::NoTopics);
        }

        let subject = classify_subject(&topics);
        self.emit(PipelineEvent::SubjectDetected { subject });

        let sections = self.generate_sections(&topics, subject, generator);
        if sections.is_empty() {
            return Err(Error::NoUsableSections);
        }

        let title = if subject.is_general() {
            "Academic Presentation".to_string()
        } else {
            format!("{} Presentation", subject.label())
        };

        let spec = PresentationSpec {
            title,
            subtitle: DEFAULT_SUBTITLE.to_string(),
            target_slide_count: (sections.len() + EXTRA_SLIDES).min(self.config.max_target_slides),
            sections,
            call_to_action: DEFAULT_CALL_TO_ACTION.to_string(),
        };

        Ok(PipelineOutput {
            spec,
            subject,
            topic_count: topics.len(),
        })
    }

    /// Build, render and save a presentation into `out_dir`.
    pub fn run<S, G, W>(
        &self,
        source: &S,
        generator: &G,
        writer: &W,
        out_dir: &Path,
    ) -> Result<RunSummary>
    where
        S: PageSource + ?Sized,
        G: TextGenerator + ?Sized,
        W: DeckWriter + ?Sized,
    {
        let output = self.build_spec(source, generator)?;
        let deck = PresentationRenderer::from_config(&self.config).render(&output.spec);

        let file_name = output_file_name(output.subject, self.config.template_name());
        let path = writer.save(&deck, &out_dir.join(file_name))?;
        self.emit(PipelineEvent::DeckSaved {
            path: path.clone(),
            slides: deck.slide_count(),
        });

        Ok(RunSummary {
            path,
            slide_count: deck.slide_count(),
            section_count: output.spec.sections.len(),
            subject: output.subject,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Deck;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct FakePages(Vec<String>);

    impl PageSource for FakePages {
        fn pages(&self) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    /// Answers topic prompts per page and content prompts per topic.
    #[derive(Default)]
    struct ScriptedGenerator {
        topics: HashMap<&'static str, &'static str>,
        content: HashMap<&'static str, &'static str>,
        requests: RefCell<Vec<GenerationRequest>>,
    }

    impl ScriptedGenerator {
        fn topic_for(mut self, page: &'static str, response: &'static str) -> Self {
            self.topics.insert(page, response);
            self
        }

        fn content_for(mut self, topic: &'static str, response: &'static str) -> Self {
            self.content.insert(topic, response);
            self
        }

        fn models(&self) -> Vec<String> {
            self.requests.borrow().iter().map(|r| r.model.clone()).collect()
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.requests.borrow_mut().push(request.clone());
            let table = if request.prompt.contains("extract the main topics") {
                &self.topics
            } else {
                &self.content
            };
            table
                .iter()
                .find(|(key, _)| request.prompt.contains(*key))
                .map(|(_, response)| response.to_string())
                .ok_or_else(|| Error::Upstream("503 Service Unavailable".to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingObserver(Arc<Mutex<Vec<PipelineEvent>>>);

    impl RecordingObserver {
        fn events(&self) -> Vec<PipelineEvent> {
            self.0.lock().unwrap().clone()
        }
    }

    impl PipelineObserver for RecordingObserver {
        fn on_event(&self, event: &PipelineEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[derive(Default)]
    struct FakeWriter(RefCell<Option<(Deck, PathBuf)>>);

    impl DeckWriter for FakeWriter {
        fn save(&self, deck: &Deck, path: &Path) -> Result<PathBuf> {
            *self.0.borrow_mut() = Some((deck.clone(), path.to_path_buf()));
            Ok(path.to_path_buf())
        }
    }

    const GOOD_BULLETS: &str = "\
1. Cell division lets a single parent cell produce two genetically identical daughter cells
2. Mitosis proceeds through prophase, metaphase, anaphase and telophase in a fixed order
3. Checkpoints halt the cycle when damaged DNA is detected before chromosomes separate
4. Cytokinesis finally splits the cytoplasm so each daughter cell receives its own organelles";

    fn pipeline(observer: &RecordingObserver) -> ContentPipeline {
        ContentPipeline::new(DeckConfig::default().without_delays()).with_observer(observer.clone())
    }

    fn biology_generator() -> ScriptedGenerator {
        ScriptedGenerator::default()
            .topic_for("PAGE ONE", "Cell Division Mechanisms\nDNA Replication Process")
            .topic_for(
                "PAGE TWO",
                "- Mechanisms of Cell Division\n- Protein Synthesis Pathways",
            )
            .content_for("Cell Division Mechanisms", GOOD_BULLETS)
            .content_for("DNA Replication Process", GOOD_BULLETS)
            .content_for("Protein Synthesis Pathways", GOOD_BULLETS)
    }

    fn pages(texts: &[&str]) -> FakePages {
        FakePages(texts.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_build_spec_end_to_end() {
        let observer = RecordingObserver::default();
        let output = pipeline(&observer)
            .build_spec(&pages(&["PAGE ONE", "PAGE TWO"]), &biology_generator())
            .unwrap();

        assert_eq!(output.subject, SubjectArea::Biology);
        assert_eq!(output.topic_count, 3);

        let spec = &output.spec;
        assert_eq!(spec.title, "Biology Presentation");
        assert_eq!(spec.subtitle, "Generated from PDF Analysis");
        assert_eq!(spec.call_to_action, "Questions and Discussion");
        assert_eq!(spec.target_slide_count, 7);

        let titles: Vec<&str> = spec.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Cell Division Mechanisms",
                "DNA Replication Process",
                "Protein Synthesis Pathways",
            ]
        );
        assert_eq!(spec.sections[0].content.len(), 4);
        assert!(spec.sections[0].content[0].starts_with("Cell division lets"));

        assert!(observer.events().contains(&PipelineEvent::TopicsDeduplicated {
            before: 4,
            after: 3
        }));
    }

    #[test]
    fn test_content_models_rotate() {
        let observer = RecordingObserver::default();
        let generator = biology_generator();
        pipeline(&observer)
            .build_spec(&pages(&["PAGE ONE", "PAGE TWO"]), &generator)
            .unwrap();

        assert_eq!(
            generator.models(),
            vec![
                "gemini-2.0-flash-exp",
                "gemini-2.0-flash-exp",
                "gemini-2.0-flash",
                "gemini-1.5-flash",
                "gemini-1.5-pro",
            ]
        );
        let requests = generator.requests.borrow();
        assert_eq!(requests[0].params, GenerationParams::topic_extraction());
        assert_eq!(requests[2].params, GenerationParams::content_generation());
        assert!(requests[2].prompt.contains("Subject context: Biology"));
    }

    #[test]
    fn test_blank_pages_are_not_sent() {
        let observer = RecordingObserver::default();
        let generator = biology_generator();
        pipeline(&observer)
            .build_spec(&pages(&["   \n", "PAGE ONE"]), &generator)
            .unwrap();

        assert_eq!(generator.models().len(), 3);
        assert_eq!(observer.events()[0], PipelineEvent::PageSkipped { page: 1 });
    }

    #[test]
    fn test_failed_page_contributes_nothing() {
        let observer = RecordingObserver::default();
        let output = pipeline(&observer)
            .build_spec(&pages(&["UNKNOWN PAGE", "PAGE ONE"]), &biology_generator())
            .unwrap();

        assert_eq!(output.topic_count, 2);
        assert!(matches!(
            observer.events()[0],
            PipelineEvent::PageFailed { page: 1, .. }
        ));
    }

    #[test]
    fn test_no_topics_is_error() {
        let observer = RecordingObserver::default();
        let generator = ScriptedGenerator::default().topic_for("PAGE ONE", "\n  \n");

        let err = pipeline(&observer)
            .build_spec(&pages(&["PAGE ONE", ""]), &generator)
            .unwrap_err();
        assert!(matches!(err, Error::NoTopics));
    }

    #[test]
    fn test_insufficient_content_dropped() {
        let observer = RecordingObserver::default();
        let generator = biology_generator().content_for(
            "DNA Replication Process",
            "Too short\nDNA copies itself",
        );
        // content_for replaced the good response for this topic
        let output = pipeline(&observer)
            .build_spec(&pages(&["PAGE ONE"]), &generator)
            .unwrap();

        assert_eq!(output.spec.sections.len(), 1);
        assert!(observer.events().contains(&PipelineEvent::InsufficientContent {
            topic: "DNA Replication Process".to_string(),
            bullets: 0,
        }));
    }

    #[test]
    fn test_failed_topic_dropped_or_fallback() {
        let generator = ScriptedGenerator::default()
            .topic_for("PAGE ONE", "Cell Division Mechanisms\nGenome Sequencing Methods")
            .content_for("Cell Division Mechanisms", GOOD_BULLETS);

        let observer = RecordingObserver::default();
        let output = pipeline(&observer)
            .build_spec(&pages(&["PAGE ONE"]), &generator)
            .unwrap();
        assert_eq!(output.spec.sections.len(), 1);
        assert!(observer
            .events()
            .iter()
            .any(|e| matches!(e, PipelineEvent::TopicFailed { topic, .. } if topic == "Genome Sequencing Methods")));

        let mut config = DeckConfig::default().without_delays();
        config.fallback_on_failure = true;
        let output = ContentPipeline::new(config)
            .with_observer(RecordingObserver::default())
            .build_spec(&pages(&["PAGE ONE"]), &generator)
            .unwrap();
        assert_eq!(output.spec.sections.len(), 2);
        assert_eq!(
            output.spec.sections[1].content,
            vec![fallback_bullet("Genome Sequencing Methods")]
        );
    }

    #[test]
    fn test_no_usable_sections_is_error() {
        let observer = RecordingObserver::default();
        let generator =
            ScriptedGenerator::default().topic_for("PAGE ONE", "Renaissance Painting Techniques");

        let err = pipeline(&observer)
            .build_spec(&pages(&["PAGE ONE"]), &generator)
            .unwrap_err();
        assert!(matches!(err, Error::NoUsableSections));
    }

    #[test]
    fn test_general_subject_title() {
        let observer = RecordingObserver::default();
        let generator = ScriptedGenerator::default()
            .topic_for("PAGE ONE", "Renaissance Painting Techniques")
            .content_for("Renaissance Painting Techniques", GOOD_BULLETS);

        let output = pipeline(&observer)
            .build_spec(&pages(&["PAGE ONE"]), &generator)
            .unwrap();
        assert_eq!(output.subject, SubjectArea::GeneralAcademic);
        assert_eq!(output.spec.title, "Academic Presentation");
        assert_eq!(output.spec.target_slide_count, 5);
        assert!(!generator.requests.borrow()[1]
            .prompt
            .contains("Subject context"));
    }

    #[test]
    fn test_target_slide_count_capped() {
        let mut config = DeckConfig::default().without_delays();
        config.max_target_slides = 5;
        let output = ContentPipeline::new(config)
            .with_observer(RecordingObserver::default())
            .build_spec(&pages(&["PAGE ONE", "PAGE TWO"]), &biology_generator())
            .unwrap();
        assert_eq!(output.spec.target_slide_count, 5);
    }

    #[test]
    fn test_run_renders_and_saves() {
        let observer = RecordingObserver::default();
        let writer = FakeWriter::default();
        let summary = pipeline(&observer)
            .run(
                &pages(&["PAGE ONE", "PAGE TWO"]),
                &biology_generator(),
                &writer,
                Path::new("out"),
            )
            .unwrap();

        assert_eq!(summary.path, Path::new("out").join("biology_presentation.pptx"));
        assert_eq!(summary.section_count, 3);
        assert_eq!(summary.subject, SubjectArea::Biology);

        let (deck, path) = writer.0.borrow().clone().unwrap();
        assert_eq!(path, summary.path);
        assert_eq!(deck.slide_count(), summary.slide_count);
        // title + one slide per section + closing
        assert_eq!(summary.slide_count, 5);

        assert!(matches!(
            observer.events().last(),
            Some(PipelineEvent::DeckSaved { slides: 5, .. })
        ));
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            output_file_name(SubjectArea::Biology, None),
            "biology_presentation.pptx"
        );
        assert_eq!(
            output_file_name(SubjectArea::ComputerScience, Some("green")),
            "computer_science_green_presentation.pptx"
        );
        assert_eq!(
            output_file_name(SubjectArea::Biology, Some("Ocean Blue (v2).PPTX")),
            "biology_ocean_blue_v2_presentation.pptx"
        );
        assert_eq!(
            output_file_name(SubjectArea::Biology, Some("!!!")),
            "biology_presentation.pptx"
        );
    }

    #[test]
    fn test_run_names_file_after_template() {
        let mut config = DeckConfig::default().without_delays();
        config.template = Some("green.pptx".to_string());
        let writer = FakeWriter::default();

        let summary = ContentPipeline::new(config)
            .with_observer(RecordingObserver::default())
            .run(
                &pages(&["PAGE ONE"]),
                &biology_generator(),
                &writer,
                Path::new("out"),
            )
            .unwrap();
        assert_eq!(
            summary.path,
            Path::new("out").join("biology_green_presentation.pptx")
        );
    }

    #[test]
    fn test_source_error_propagates() {
        struct BrokenPages;
        impl PageSource for BrokenPages {
            fn pages(&self) -> Result<Vec<String>> {
                Err(Error::PdfExtraction("not a PDF".to_string()))
            }
        }

        let err = ContentPipeline::default()
            .build_spec(&BrokenPages, &biology_generator())
            .unwrap_err();
        assert!(matches!(err, Error::PdfExtraction(_)));
    }
}
