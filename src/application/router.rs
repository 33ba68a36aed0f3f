//! Diagnostic router: decides the single execution path for a request.
//!
//! Precedence, first match wins:
//! 1. specialized imaging with an image → tissue classifier;
//!    specialized imaging without one → "please provide an image"
//! 2. speech and image → vision model, instruction + transcript
//! 3. image only → vision model, instruction only
//! 4. speech only → text-only reasoning, no image argument
//! 5. nothing → "please provide input"
//!
//! Whatever text comes out is always handed to the voice synthesizer. No
//! adapter error escapes: every call returns a [`DiagnosticOutcome`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::modality::detect_bundle;
use crate::domain::{
    request_id, Category, ClassificationResult, DiagnosticOutcome, FailureKind, ImageRef,
    InputBundle, Modality, RequestMachine, RequestPhase, RoutePath,
};
use crate::ports::{ImageClassifier, Reasoner, Transcriber, VoiceSynthesizer};

/// Instruction prepended to every reasoning request.
pub const SYSTEM_PROMPT: &str = "You have to act as a professional doctor, i know you are not but this is for learning purpose. \
What's in this image? Do you find anything wrong with it medically? \
If you make a differential, suggest some remedies for them. Do not add any numbers or special characters in your response. \
Your response should be in one long paragraph. Also always answer as if you are answering to a real person. \
Do not say 'In the image I see' but say 'With what I see, I think you have ....' \
Do not respond as an AI model in markdown, your answer should mimic that of an actual doctor not an AI bot. \
Keep your answer concise (max 2 sentences). No preamble, start your answer right away please";

/// Spoken when the request carries neither speech nor an image.
pub const NO_INPUT_MESSAGE: &str =
    "No input provided. Please describe your symptoms by voice or upload a medical image.";

/// Spoken when specialized imaging was requested without an image.
pub const IMAGE_REQUIRED_MESSAGE: &str =
    "No image provided for analysis. Please upload the tissue image you would like examined.";

/// Spoken whenever an external service fails.
pub const FAILURE_MESSAGE: &str = "An error occurred while processing. Please try again.";

/// Transcript shown to the caller when no recording was supplied.
pub const NO_AUDIO_TRANSCRIPT: &str = "No audio input provided.";

/// Canned explanation read to the patient for each tissue category.
#[must_use]
pub fn explanation_for(category: Category) -> &'static str {
    match category {
        Category::Normal => {
            "Normal: Cells appear healthy and show no signs of cancer. \
             There is no indication of abnormal tissue structure or cellular activity. \
             No further investigation is typically required, but periodic screenings help ensure continued health."
        }
        Category::Benign => {
            "Benign: Cells may appear abnormal but are non-cancerous and do not spread to other tissues. \
             These growths are usually slow-growing and not life-threatening. \
             Monitoring for changes in size or behavior is common, and removal may be considered if symptoms develop."
        }
        Category::Malignant => {
            "Malignant: Cells are cancerous, showing uncontrolled growth, abnormal structure, and potential to invade nearby tissues or spread to distant organs. \
             Further diagnostic evaluation and staging are important to determine the extent. \
             Management may involve treatment plans such as surgery, chemotherapy, or radiation depending on the progression."
        }
    }
}

/// Model identifiers passed through to the adapters.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub stt_model: String,
    pub vision_model: String,
}

impl RouterSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            stt_model: config.stt_model.clone(),
            vision_model: config.vision_model.clone(),
        }
    }
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Text chosen by the decision procedure, before synthesis.
struct Decision {
    route: RoutePath,
    text: String,
    failure: Option<FailureKind>,
}

/// Routes one request at a time through exactly one analysis adapter and
/// then through the voice synthesizer.
pub struct DiagnosticRouter<C, R, T, V>
where
    C: ImageClassifier,
    R: Reasoner,
    T: Transcriber,
    V: VoiceSynthesizer,
{
    classifier: Arc<C>,
    reasoner: Arc<R>,
    transcriber: Arc<T>,
    voice: Arc<V>,
    settings: RouterSettings,
}

impl<C, R, T, V> DiagnosticRouter<C, R, T, V>
where
    C: ImageClassifier,
    R: Reasoner,
    T: Transcriber,
    V: VoiceSynthesizer,
{
    pub fn new(
        classifier: Arc<C>,
        reasoner: Arc<R>,
        transcriber: Arc<T>,
        voice: Arc<V>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            classifier,
            reasoner,
            transcriber,
            voice,
            settings,
        }
    }

    /// Caller-facing entry point: transcribe the recording (if any), route,
    /// and synthesize.
    pub fn diagnose(&self, audio: Option<&Path>, image: Option<ImageRef>) -> DiagnosticOutcome {
        let id = request_id();
        let span = tracing::info_span!("diagnose", request_id = %id);
        let _enter = span.enter();

        let mut machine = RequestMachine::new();

        let Some(audio) = audio else {
            machine.advance(RequestPhase::Detecting);
            let bundle = InputBundle::new(None, image);
            return self.finish(id, machine, NO_AUDIO_TRANSCRIPT.to_string(), &bundle);
        };

        machine.advance(RequestPhase::Transcribing);
        match self.transcriber.transcribe(audio, &self.settings.stt_model) {
            Ok(transcript) => {
                tracing::debug!(chars = transcript.len(), "Transcription complete");
                machine.advance(RequestPhase::Detecting);
                let bundle = InputBundle::new(Some(transcript.clone()), image);
                self.finish(id, machine, transcript, &bundle)
            }
            Err(e) => {
                tracing::warn!("Transcription failed: {e}");
                machine.advance(RequestPhase::Error);
                let decision = Decision {
                    route: RoutePath::Aborted,
                    text: FAILURE_MESSAGE.to_string(),
                    failure: Some(FailureKind::Transcription),
                };
                self.speak(id, machine, String::new(), decision)
            }
        }
    }

    /// Route an already-assembled bundle.
    pub fn route(&self, bundle: InputBundle) -> DiagnosticOutcome {
        let id = request_id();
        let span = tracing::info_span!("route", request_id = %id);
        let _enter = span.enter();

        let mut machine = RequestMachine::new();
        machine.advance(RequestPhase::Detecting);
        let transcript = bundle.transcript().unwrap_or_default().to_string();
        self.finish(id, machine, transcript, &bundle)
    }

    fn finish(
        &self,
        id: String,
        mut machine: RequestMachine,
        transcript: String,
        bundle: &InputBundle,
    ) -> DiagnosticOutcome {
        let decision = self.decide(&mut machine, bundle);
        self.speak(id, machine, transcript, decision)
    }

    /// Run the precedence-ordered policy. The machine is in `Detecting` on
    /// entry and in `Classifying`/`Reasoning`/`Idle`/`Error` on return.
    fn decide(&self, machine: &mut RequestMachine, bundle: &InputBundle) -> Decision {
        let signal = detect_bundle(bundle);
        tracing::info!(
            modality = %signal.modality,
            specialized = signal.is_specialized_imaging,
            "Modality detected"
        );

        if signal.is_specialized_imaging {
            machine.advance(RequestPhase::Classifying);
            let Some(image) = bundle.image().filter(|_| signal.modality.has_image()) else {
                tracing::warn!("Specialized imaging requested without an image");
                machine.advance(RequestPhase::Error);
                return Decision {
                    route: RoutePath::ImageRequired,
                    text: IMAGE_REQUIRED_MESSAGE.to_string(),
                    failure: Some(FailureKind::DetectionAmbiguity),
                };
            };
            return match self.classify(image) {
                Ok(result) => Decision {
                    route: RoutePath::Specialized,
                    text: result.explanation().to_string(),
                    failure: None,
                },
                Err(e) => {
                    tracing::warn!("Tissue classifier failed: {e}");
                    machine.advance(RequestPhase::Error);
                    Decision {
                        route: RoutePath::Specialized,
                        text: FAILURE_MESSAGE.to_string(),
                        failure: Some(FailureKind::Classifier),
                    }
                }
            };
        }

        let route = match signal.modality {
            Modality::AudioAndImage => RoutePath::VisionWithSpeech,
            Modality::ImageOnly => RoutePath::VisionOnly,
            Modality::AudioOnly => RoutePath::TextOnly,
            Modality::None => {
                tracing::info!("No speech or image supplied");
                machine.advance(RequestPhase::Idle);
                return Decision {
                    route: RoutePath::NoInput,
                    text: NO_INPUT_MESSAGE.to_string(),
                    failure: None,
                };
            }
        };
        let transcript = bundle
            .transcript()
            .map(str::trim)
            .filter(|_| signal.modality.has_audio());
        let image = bundle.image().filter(|_| signal.modality.has_image());
        let prompt = compose_prompt(transcript);

        machine.advance(RequestPhase::Reasoning);
        tracing::info!(%route, model = %self.settings.vision_model, "Using reasoning model for diagnosis");
        match self.reasoner.reason(&prompt, image, &self.settings.vision_model) {
            Ok(text) => Decision {
                route,
                text,
                failure: None,
            },
            Err(e) => {
                tracing::warn!("Reasoning service failed: {e}");
                machine.advance(RequestPhase::Error);
                Decision {
                    route,
                    text: FAILURE_MESSAGE.to_string(),
                    failure: Some(FailureKind::Reasoning),
                }
            }
        }
    }

    fn classify(&self, image: &ImageRef) -> Result<ClassificationResult, crate::ports::ClassifierError> {
        tracing::info!("Specialized imaging case, routing to tissue classifier");
        let raw = self.classifier.classify(image)?;
        tracing::info!(category = raw.category.label(), scores = ?raw.scores, "Tissue classified");
        Ok(ClassificationResult::new(raw.category, explanation_for(raw.category)))
    }

    /// Synthesize the decided text and close the request.
    fn speak(
        &self,
        id: String,
        mut machine: RequestMachine,
        transcript: String,
        decision: Decision,
    ) -> DiagnosticOutcome {
        let Decision {
            route,
            mut text,
            mut failure,
        } = decision;

        machine.advance(RequestPhase::Synthesizing);
        let audio_path: Option<PathBuf> = match self.voice.synthesize(&text) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Speech synthesis failed: {e}");
                machine.advance(RequestPhase::Error);
                text = FAILURE_MESSAGE.to_string();
                failure = failure.or(Some(FailureKind::Synthesis));
                None
            }
        };
        machine.advance(RequestPhase::Done);
        tracing::debug!(phases = ?machine.history(), "Request phases");

        let outcome = DiagnosticOutcome {
            request_id: id,
            transcript,
            diagnosis_text: text,
            audio_path,
            route,
            failure,
            phases: machine.into_history(),
        };

        tracing::info!(
            route = %outcome.route,
            degraded = outcome.is_degraded(),
            audio = outcome.audio_path.is_some(),
            "Request complete"
        );
        outcome
    }
}

/// Instruction alone, or instruction followed by the patient's words.
#[must_use]
pub fn compose_prompt(transcript: Option<&str>) -> String {
    match transcript {
        Some(t) => format!("{SYSTEM_PROMPT} {t}"),
        None => SYSTEM_PROMPT.to_string(),
    }
}

/// The last synthesized answer, if it is still on disk.
#[must_use]
pub fn replay_audio(output_path: &Path) -> Option<PathBuf> {
    output_path.is_file().then(|| output_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{
        ClassifierError, RawClassification, ReasoningError, SynthesisError, TranscriptionError,
    };
    use std::sync::Mutex;

    struct ScriptedClassifier {
        result: Result<Category, ClassifierError>,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl ScriptedClassifier {
        fn returning(category: Category) -> Self {
            Self {
                result: Ok(category),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                result: Err(ClassifierError::UnreadableImage("corrupt".to_string())),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl ImageClassifier for ScriptedClassifier {
        fn classify(&self, image: &ImageRef) -> Result<RawClassification, ClassifierError> {
            self.calls.lock().unwrap().push(image.path().to_path_buf());
            self.result.clone().map(|category| RawClassification {
                category,
                scores: vec![0.1, 0.2, 0.7],
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct ReasonCall {
        prompt: String,
        image: Option<PathBuf>,
        model: String,
    }

    struct ScriptedReasoner {
        result: Result<String, ReasoningError>,
        calls: Mutex<Vec<ReasonCall>>,
    }

    impl ScriptedReasoner {
        fn answering(text: &str) -> Self {
            Self {
                result: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                result: Err(ReasoningError::Timeout(30)),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<ReasonCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Reasoner for ScriptedReasoner {
        fn reason(
            &self,
            prompt: &str,
            image: Option<&ImageRef>,
            model_id: &str,
        ) -> Result<String, ReasoningError> {
            self.calls.lock().unwrap().push(ReasonCall {
                prompt: prompt.to_string(),
                image: image.map(|i| i.path().to_path_buf()),
                model: model_id.to_string(),
            });
            self.result.clone()
        }
    }

    struct ScriptedTranscriber {
        result: Result<String, TranscriptionError>,
    }

    impl Transcriber for ScriptedTranscriber {
        fn transcribe(&self, _audio: &Path, _model_id: &str) -> Result<String, TranscriptionError> {
            self.result.clone()
        }
    }

    struct RecordingVoice {
        fail: bool,
        spoken: Mutex<Vec<String>>,
    }

    impl RecordingVoice {
        fn working() -> Self {
            Self {
                fail: false,
                spoken: Mutex::new(Vec::new()),
            }
        }

        fn broken() -> Self {
            Self {
                fail: true,
                spoken: Mutex::new(Vec::new()),
            }
        }

        fn spoken(&self) -> Vec<String> {
            self.spoken.lock().unwrap().clone()
        }
    }

    impl VoiceSynthesizer for RecordingVoice {
        fn synthesize(&self, text: &str) -> Result<PathBuf, SynthesisError> {
            self.spoken.lock().unwrap().push(text.to_string());
            if self.fail {
                Err(SynthesisError::Connection("refused".to_string()))
            } else {
                Ok(PathBuf::from("static/final.mp3"))
            }
        }
    }

    struct Harness {
        classifier: Arc<ScriptedClassifier>,
        reasoner: Arc<ScriptedReasoner>,
        voice: Arc<RecordingVoice>,
        router: DiagnosticRouter<ScriptedClassifier, ScriptedReasoner, ScriptedTranscriber, RecordingVoice>,
    }

    fn harness_with(
        classifier: ScriptedClassifier,
        reasoner: ScriptedReasoner,
        transcriber: ScriptedTranscriber,
        voice: RecordingVoice,
    ) -> Harness {
        let classifier = Arc::new(classifier);
        let reasoner = Arc::new(reasoner);
        let voice = Arc::new(voice);
        let router = DiagnosticRouter::new(
            Arc::clone(&classifier),
            Arc::clone(&reasoner),
            Arc::new(transcriber),
            Arc::clone(&voice),
            RouterSettings {
                stt_model: "whisper-test".to_string(),
                vision_model: "vision-test".to_string(),
            },
        );
        Harness {
            classifier,
            reasoner,
            voice,
            router,
        }
    }

    fn harness() -> Harness {
        harness_with(
            ScriptedClassifier::returning(Category::Benign),
            ScriptedReasoner::answering("With what I see, I think you have eczema."),
            ScriptedTranscriber {
                result: Ok("my skin itches".to_string()),
            },
            RecordingVoice::working(),
        )
    }

    #[test]
    fn test_no_input_yields_placeholder_and_still_speaks() {
        let h = harness();
        let outcome = h.router.route(InputBundle::empty());

        assert_eq!(outcome.diagnosis_text, NO_INPUT_MESSAGE);
        assert_eq!(outcome.route, RoutePath::NoInput);
        assert!(outcome.failure.is_none());
        assert_eq!(outcome.audio_path, Some(PathBuf::from("static/final.mp3")));
        assert_eq!(h.voice.spoken(), vec![NO_INPUT_MESSAGE.to_string()]);
        assert_eq!(h.classifier.call_count(), 0);
        assert!(h.reasoner.calls().is_empty());
        assert_eq!(
            outcome.phases,
            vec![
                RequestPhase::Start,
                RequestPhase::Detecting,
                RequestPhase::Idle,
                RequestPhase::Synthesizing,
                RequestPhase::Done
            ]
        );
    }

    #[test]
    fn test_deserialized_blank_transcript_routes_as_no_input() {
        let h = harness();
        let bundle: InputBundle =
            serde_json::from_str(r#"{"transcript":"   ","image":null}"#).expect("parses");
        let outcome = h.router.route(bundle);

        assert_eq!(outcome.route, RoutePath::NoInput);
        assert_eq!(outcome.diagnosis_text, NO_INPUT_MESSAGE);
        assert!(h.reasoner.calls().is_empty());
        assert_eq!(h.classifier.call_count(), 0);
    }

    #[test]
    fn test_padded_transcript_reaches_prompt_trimmed() {
        let h = harness();
        let bundle: InputBundle =
            serde_json::from_str(r#"{"transcript":"  my throat is sore  "}"#).expect("parses");
        let outcome = h.router.route(bundle);

        assert_eq!(outcome.route, RoutePath::TextOnly);
        let calls = h.reasoner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, format!("{SYSTEM_PROMPT} my throat is sore"));
        assert!(calls[0].image.is_none());
    }

    #[test]
    fn test_keyword_with_image_uses_classifier_only() {
        for category in [Category::Normal, Category::Benign, Category::Malignant] {
            let h = harness_with(
                ScriptedClassifier::returning(category),
                ScriptedReasoner::answering("unused"),
                ScriptedTranscriber { result: Ok(String::new()) },
                RecordingVoice::working(),
            );
            let bundle = InputBundle::empty()
                .with_transcript("I have a tissue concern")
                .with_image(ImageRef::new("uploads/lump.png"));
            let outcome = h.router.route(bundle);

            assert_eq!(outcome.route, RoutePath::Specialized);
            assert_eq!(outcome.diagnosis_text, explanation_for(category));
            assert_eq!(h.classifier.call_count(), 1);
            assert!(h.reasoner.calls().is_empty());
            assert_eq!(h.voice.spoken(), vec![explanation_for(category).to_string()]);
        }
    }

    #[test]
    fn test_keyword_without_image_requires_image() {
        let h = harness();
        let outcome = h.router.route(InputBundle::empty().with_transcript("please run HSI"));

        assert_eq!(outcome.diagnosis_text, IMAGE_REQUIRED_MESSAGE);
        assert_eq!(outcome.route, RoutePath::ImageRequired);
        assert_eq!(outcome.failure, Some(FailureKind::DetectionAmbiguity));
        assert!(h.reasoner.calls().is_empty());
        assert_eq!(h.classifier.call_count(), 0);
        assert_eq!(h.voice.spoken(), vec![IMAGE_REQUIRED_MESSAGE.to_string()]);
        assert!(outcome.audio_path.is_some());
    }

    #[test]
    fn test_extension_alone_triggers_specialized_path() {
        let h = harness();
        let bundle = InputBundle::new(Some(String::new()), Some(ImageRef::new("scan.hdr")));
        let outcome = h.router.route(bundle);

        assert_eq!(outcome.route, RoutePath::Specialized);
        assert_eq!(h.classifier.call_count(), 1);
        assert!(h.reasoner.calls().is_empty());
    }

    #[test]
    fn test_image_only_prompt_is_bare_instruction() {
        let h = harness();
        let outcome = h.router.route(InputBundle::empty().with_image(ImageRef::new("rash.jpg")));

        assert_eq!(outcome.route, RoutePath::VisionOnly);
        let calls = h.reasoner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, SYSTEM_PROMPT);
        assert_eq!(calls[0].image, Some(PathBuf::from("rash.jpg")));
        assert_eq!(calls[0].model, "vision-test");
    }

    #[test]
    fn test_speech_and_image_prompt_carries_transcript() {
        let h = harness();
        let bundle = InputBundle::empty()
            .with_transcript("it burns at night")
            .with_image(ImageRef::new("rash.jpg"));
        let outcome = h.router.route(bundle);

        assert_eq!(outcome.route, RoutePath::VisionWithSpeech);
        assert_eq!(outcome.transcript, "it burns at night");
        let calls = h.reasoner.calls();
        assert_eq!(calls[0].prompt, format!("{SYSTEM_PROMPT} it burns at night"));
        assert!(calls[0].image.is_some());
        assert_eq!(outcome.diagnosis_text, "With what I see, I think you have eczema.");
    }

    #[test]
    fn test_speech_only_omits_image_argument() {
        let h = harness();
        let outcome = h.router.route(InputBundle::empty().with_transcript("I keep coughing"));

        assert_eq!(outcome.route, RoutePath::TextOnly);
        let calls = h.reasoner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].image, None);
        assert!(calls[0].prompt.ends_with("I keep coughing"));
    }

    #[test]
    fn test_reasoning_failure_degrades_and_speaks_failure() {
        let h = harness_with(
            ScriptedClassifier::returning(Category::Normal),
            ScriptedReasoner::failing(),
            ScriptedTranscriber { result: Ok(String::new()) },
            RecordingVoice::working(),
        );
        let outcome = h.router.route(InputBundle::empty().with_image(ImageRef::new("x.png")));

        assert_eq!(outcome.diagnosis_text, FAILURE_MESSAGE);
        assert_eq!(outcome.failure, Some(FailureKind::Reasoning));
        assert_eq!(h.voice.spoken(), vec![FAILURE_MESSAGE.to_string()]);
        assert!(outcome.audio_path.is_some());
        assert_eq!(
            outcome.phases,
            vec![
                RequestPhase::Start,
                RequestPhase::Detecting,
                RequestPhase::Reasoning,
                RequestPhase::Error,
                RequestPhase::Synthesizing,
                RequestPhase::Done
            ]
        );
    }

    #[test]
    fn test_classifier_failure_does_not_fall_back_to_reasoning() {
        let h = harness_with(
            ScriptedClassifier::failing(),
            ScriptedReasoner::answering("unused"),
            ScriptedTranscriber { result: Ok(String::new()) },
            RecordingVoice::working(),
        );
        let outcome = h.router.route(InputBundle::empty().with_image(ImageRef::new("cube.npy")));

        assert_eq!(outcome.diagnosis_text, FAILURE_MESSAGE);
        assert_eq!(outcome.failure, Some(FailureKind::Classifier));
        assert!(h.reasoner.calls().is_empty());
    }

    #[test]
    fn test_synthesis_failure_leaves_no_audio() {
        let h = harness_with(
            ScriptedClassifier::returning(Category::Normal),
            ScriptedReasoner::answering("fine"),
            ScriptedTranscriber { result: Ok(String::new()) },
            RecordingVoice::broken(),
        );
        let outcome = h.router.route(InputBundle::empty().with_transcript("headache"));

        assert_eq!(outcome.audio_path, None);
        assert_eq!(outcome.diagnosis_text, FAILURE_MESSAGE);
        assert_eq!(outcome.failure, Some(FailureKind::Synthesis));
        assert_eq!(outcome.phases.last(), Some(&RequestPhase::Done));
        assert!(outcome.phases.windows(2).all(|w| w[0].can_transition(w[1])));
    }

    #[test]
    fn test_route_is_deterministic_under_fixed_adapters() {
        let h = harness();
        let bundle = InputBundle::empty()
            .with_transcript("swollen ankle")
            .with_image(ImageRef::new("ankle.jpg"));
        let first = h.router.route(bundle.clone());
        let second = h.router.route(bundle);

        assert_eq!(first.diagnosis_text, second.diagnosis_text);
        assert_eq!(first.route, second.route);
        assert_ne!(first.request_id, second.request_id);
    }

    #[test]
    fn test_diagnose_without_audio_shows_placeholder_transcript() {
        let h = harness();
        let outcome = h.router.diagnose(None, Some(ImageRef::new("mole.png")));

        assert_eq!(outcome.transcript, NO_AUDIO_TRANSCRIPT);
        assert_eq!(outcome.route, RoutePath::VisionOnly);
        // The display placeholder never reaches the model.
        assert_eq!(h.reasoner.calls()[0].prompt, SYSTEM_PROMPT);
    }

    #[test]
    fn test_diagnose_transcribes_before_routing() {
        let h = harness_with(
            ScriptedClassifier::returning(Category::Malignant),
            ScriptedReasoner::answering("unused"),
            ScriptedTranscriber {
                result: Ok("Hyperspectral imaging of my tissue".to_string()),
            },
            RecordingVoice::working(),
        );
        let outcome = h
            .router
            .diagnose(Some(Path::new("voice.mp3")), Some(ImageRef::new("slide.png")));

        assert_eq!(outcome.transcript, "Hyperspectral imaging of my tissue");
        assert_eq!(outcome.diagnosis_text, explanation_for(Category::Malignant));
        assert_eq!(outcome.phases[1], RequestPhase::Transcribing);
    }

    #[test]
    fn test_transcription_failure_degrades() {
        let h = harness_with(
            ScriptedClassifier::returning(Category::Normal),
            ScriptedReasoner::answering("unused"),
            ScriptedTranscriber {
                result: Err(TranscriptionError::Connection("dns".to_string())),
            },
            RecordingVoice::working(),
        );
        let outcome = h
            .router
            .diagnose(Some(Path::new("voice.mp3")), Some(ImageRef::new("slide.png")));

        assert_eq!(outcome.route, RoutePath::Aborted);
        assert_eq!(outcome.failure, Some(FailureKind::Transcription));
        assert_eq!(outcome.diagnosis_text, FAILURE_MESSAGE);
        assert_eq!(outcome.transcript, "");
        assert!(h.reasoner.calls().is_empty());
        assert_eq!(h.classifier.call_count(), 0);
        assert_eq!(h.voice.spoken(), vec![FAILURE_MESSAGE.to_string()]);
    }

    #[test]
    fn test_unconfigured_groq_degrades_instead_of_failing() {
        use crate::adapters::groq::GroqClient;

        let groq = Arc::new(
            GroqClient::new("http://127.0.0.1:9", None, std::time::Duration::from_secs(1))
                .expect("client builds"),
        );
        let voice = Arc::new(RecordingVoice::working());
        let router = DiagnosticRouter::new(
            Arc::new(ScriptedClassifier::returning(Category::Normal)),
            Arc::clone(&groq),
            groq,
            Arc::clone(&voice),
            RouterSettings::default(),
        );

        let idle = router.route(InputBundle::empty());
        assert_eq!(idle.diagnosis_text, NO_INPUT_MESSAGE);
        assert!(idle.failure.is_none());

        let spoken = router.route(InputBundle::empty().with_transcript("my ear hurts"));
        assert_eq!(spoken.route, RoutePath::TextOnly);
        assert_eq!(spoken.diagnosis_text, FAILURE_MESSAGE);
        assert_eq!(spoken.failure, Some(FailureKind::Reasoning));
        assert_eq!(voice.spoken(), vec![NO_INPUT_MESSAGE.to_string(), FAILURE_MESSAGE.to_string()]);
    }

    #[test]
    fn test_compose_prompt() {
        assert_eq!(compose_prompt(None), SYSTEM_PROMPT);
        assert_eq!(compose_prompt(Some("sore throat")), format!("{SYSTEM_PROMPT} sore throat"));
    }

    #[test]
    fn test_explanations_are_distinct() {
        let texts = [
            explanation_for(Category::Normal),
            explanation_for(Category::Benign),
            explanation_for(Category::Malignant),
        ];
        assert!(texts[0].starts_with("Normal:"));
        assert!(texts[1].starts_with("Benign:"));
        assert!(texts[2].starts_with("Malignant:"));
    }

    #[test]
    fn test_replay_audio() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("final.mp3");
        assert_eq!(replay_audio(&path), None);
        std::fs::write(&path, b"ID3").expect("write");
        assert_eq!(replay_audio(&path), Some(path.clone()));
    }
}
