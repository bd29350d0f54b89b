//! Built-in node catalog.

use super::spec::{
    NodeCategory, NodeMetadata, NodeSpec, ParameterKind, ParameterSpec, ParameterValidation,
    PortSpec, SelectOption,
};
use crate::pipeline::port::ANY_MIME;
use serde_json::{json, Value};

/// Spec id of the designated file-input kind used for uploads.
pub const FILE_INPUT_SPEC_ID: &str = "file-input";

const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PDF: &str = "application/pdf";
const COMMON_IMAGES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

fn metadata(name: &str, description: &str, category: NodeCategory, tags: &[&str]) -> NodeMetadata {
    NodeMetadata {
        name: name.to_string(),
        description: description.to_string(),
        category,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        author: None,
        license: None,
        documentation: None,
    }
}

fn spec(
    id: &str,
    kind: &str,
    metadata: NodeMetadata,
    inputs: Vec<PortSpec>,
    outputs: Vec<PortSpec>,
    parameters: Vec<ParameterSpec>,
    ui_meta: Value,
) -> NodeSpec {
    NodeSpec {
        id: id.to_string(),
        kind: kind.to_string(),
        version: "1.0.0".to_string(),
        metadata,
        inputs,
        outputs,
        parameters,
        ui_meta,
    }
}

fn param(id: &str, name: &str, kind: ParameterKind, default_value: Value, required: bool) -> ParameterSpec {
    ParameterSpec {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        default_value,
        required,
        validation: None,
        description: None,
        ui_hints: Value::Null,
    }
}

fn number(id: &str, name: &str, default: f64, min: Option<f64>, max: Option<f64>, required: bool) -> ParameterSpec {
    ParameterSpec {
        validation: Some(ParameterValidation::range(min, max)),
        ..param(id, name, ParameterKind::Number, json!(default), required)
    }
}

fn select(id: &str, name: &str, default: &str, options: &[(&str, &str)], required: bool) -> ParameterSpec {
    let options = options
        .iter()
        .map(|(value, label)| SelectOption::new(*value, *label))
        .collect();
    ParameterSpec {
        validation: Some(ParameterValidation::options(options)),
        ..param(id, name, ParameterKind::Select, json!(default), required)
    }
}

/// Every node kind shipped with the studio, file input first.
pub fn builtin_specs() -> Vec<NodeSpec> {
    vec![
        spec(
            FILE_INPUT_SPEC_ID,
            "input",
            metadata(
                "File Input",
                "Upload files to start conversion",
                NodeCategory::Utility,
                &["upload", "file", "input"],
            ),
            vec![],
            vec![PortSpec::new("output", "File", &[ANY_MIME])],
            vec![],
            json!({ "icon": "Upload", "color": "#3B82F6" }),
        ),
        spec(
            "pdf-to-docx",
            "converter",
            metadata(
                "PDF to DOCX",
                "Convert PDF documents to Microsoft Word format using LibreOffice",
                NodeCategory::Document,
                &["pdf", "docx", "office", "libreoffice"],
            ),
            vec![PortSpec::new("input", "PDF File", &[PDF])],
            vec![PortSpec::new("output", "DOCX File", &[DOCX])],
            vec![ParameterSpec {
                description: Some("Quality vs speed tradeoff".to_string()),
                ..select(
                    "quality",
                    "Conversion Quality",
                    "high",
                    &[("low", "Low (Fast)"), ("medium", "Medium"), ("high", "High (Slow)")],
                    false,
                )
            }],
            json!({
                "icon": "FileText",
                "color": "#DC2626",
                "preview": { "enabled": true, "maxSize": 52_428_800, "supportedTypes": [PDF] }
            }),
        ),
        spec(
            "docx-to-pdf",
            "converter",
            metadata(
                "DOCX to PDF",
                "Convert Microsoft Word documents to PDF format",
                NodeCategory::Document,
                &["docx", "pdf", "office"],
            ),
            vec![PortSpec::new("input", "DOCX File", &[DOCX])],
            vec![PortSpec::new("output", "PDF File", &[PDF])],
            vec![],
            json!({ "icon": "FileText", "color": "#2563EB" }),
        ),
        spec(
            "image-resize",
            "processor",
            metadata(
                "Resize Image",
                "Resize images using ImageMagick with various algorithms",
                NodeCategory::Image,
                &["resize", "scale", "imagemagick"],
            ),
            vec![PortSpec::new("input", "Image", COMMON_IMAGES)],
            vec![PortSpec::new("output", "Resized Image", COMMON_IMAGES)],
            vec![
                ParameterSpec {
                    ui_hints: json!({ "suffix": "px" }),
                    ..number("width", "Width", 800.0, Some(1.0), Some(8192.0), true)
                },
                ParameterSpec {
                    ui_hints: json!({ "suffix": "px" }),
                    ..number("height", "Height", 600.0, Some(1.0), Some(8192.0), true)
                },
                param(
                    "maintain_aspect",
                    "Maintain Aspect Ratio",
                    ParameterKind::Boolean,
                    json!(true),
                    false,
                ),
            ],
            json!({
                "icon": "Image",
                "color": "#059669",
                "preview": { "enabled": true, "maxSize": 10_485_760, "supportedTypes": COMMON_IMAGES }
            }),
        ),
        spec(
            "image-format-convert",
            "converter",
            metadata(
                "Convert Image Format",
                "Convert between different image formats",
                NodeCategory::Image,
                &["convert", "format", "jpeg", "png", "webp"],
            ),
            vec![PortSpec::new("input", "Image", &["image/*"])],
            vec![PortSpec::new(
                "output",
                "Converted Image",
                &["image/jpeg", "image/png", "image/webp", "image/gif"],
            )],
            vec![select(
                "format",
                "Output Format",
                "jpeg",
                &[("jpeg", "JPEG"), ("png", "PNG"), ("webp", "WebP"), ("gif", "GIF")],
                true,
            )],
            json!({ "icon": "Image", "color": "#7C3AED" }),
        ),
        spec(
            "ai-summarize",
            "ai-processor",
            metadata(
                "AI Summarize",
                "Generate intelligent summaries using large language models",
                NodeCategory::Ai,
                &["ai", "summarize", "llm", "text"],
            ),
            vec![PortSpec::new("input", "Text Document", &["text/plain", PDF, DOCX])],
            vec![PortSpec::new("output", "Summary", &["text/plain"])],
            vec![
                select(
                    "model",
                    "AI Model",
                    "gpt-3.5-turbo",
                    &[
                        ("gpt-3.5-turbo", "GPT-3.5 Turbo"),
                        ("gpt-4", "GPT-4"),
                        ("claude-3-sonnet", "Claude 3 Sonnet"),
                        ("ollama-llama2", "Llama 2 (Local)"),
                    ],
                    true,
                ),
                select(
                    "length",
                    "Summary Length",
                    "medium",
                    &[
                        ("short", "Short (1-2 paragraphs)"),
                        ("medium", "Medium (3-5 paragraphs)"),
                        ("long", "Long (6+ paragraphs)"),
                    ],
                    false,
                ),
                select(
                    "language",
                    "Output Language",
                    "en",
                    &[
                        ("en", "English"),
                        ("ru", "Russian"),
                        ("es", "Spanish"),
                        ("fr", "French"),
                        ("de", "German"),
                    ],
                    false,
                ),
            ],
            json!({ "icon": "Brain", "color": "#F59E0B" }),
        ),
        spec(
            "ai-translate",
            "ai-processor",
            metadata(
                "AI Translate",
                "Translate text using advanced AI models",
                NodeCategory::Ai,
                &["ai", "translate", "language", "llm"],
            ),
            vec![PortSpec::new("input", "Text", &["text/plain"])],
            vec![PortSpec::new("output", "Translated Text", &["text/plain"])],
            vec![select(
                "target_language",
                "Target Language",
                "ru",
                &[
                    ("en", "English"),
                    ("ru", "Russian"),
                    ("es", "Spanish"),
                    ("fr", "French"),
                    ("de", "German"),
                    ("zh", "Chinese"),
                    ("ja", "Japanese"),
                ],
                true,
            )],
            json!({ "icon": "Languages", "color": "#8B5CF6" }),
        ),
        spec(
            "text-to-speech",
            "ai-processor",
            metadata(
                "Text to Speech",
                "Convert text to natural-sounding speech",
                NodeCategory::Ai,
                &["tts", "speech", "audio", "voice"],
            ),
            vec![PortSpec::new("input", "Text", &["text/plain"])],
            vec![PortSpec::new("output", "Audio", &["audio/mpeg", "audio/wav"])],
            vec![
                select(
                    "voice",
                    "Voice",
                    "alloy",
                    &[
                        ("alloy", "Alloy"),
                        ("echo", "Echo"),
                        ("fable", "Fable"),
                        ("onyx", "Onyx"),
                        ("nova", "Nova"),
                        ("shimmer", "Shimmer"),
                    ],
                    true,
                ),
                ParameterSpec {
                    kind: ParameterKind::Range,
                    ui_hints: json!({ "step": 0.25 }),
                    ..number("speed", "Speed", 1.0, Some(0.25), Some(4.0), false)
                },
            ],
            json!({ "icon": "Volume2", "color": "#EF4444" }),
        ),
        spec(
            "audio-convert",
            "converter",
            metadata(
                "Convert Audio Format",
                "Convert between different audio formats using FFmpeg",
                NodeCategory::Audio,
                &["audio", "convert", "ffmpeg", "mp3", "wav"],
            ),
            vec![PortSpec::new("input", "Audio File", &["audio/*"])],
            vec![PortSpec::new(
                "output",
                "Converted Audio",
                &["audio/mpeg", "audio/wav", "audio/ogg", "audio/aac"],
            )],
            vec![
                select(
                    "format",
                    "Output Format",
                    "mp3",
                    &[("mp3", "MP3"), ("wav", "WAV"), ("ogg", "OGG"), ("aac", "AAC")],
                    true,
                ),
                select(
                    "bitrate",
                    "Bitrate",
                    "192k",
                    &[
                        ("128k", "128 kbps"),
                        ("192k", "192 kbps"),
                        ("256k", "256 kbps"),
                        ("320k", "320 kbps"),
                    ],
                    false,
                ),
            ],
            json!({ "icon": "Music", "color": "#10B981" }),
        ),
        spec(
            "video-to-gif",
            "converter",
            metadata(
                "Video to GIF",
                "Convert video clips to optimized GIF animations",
                NodeCategory::Video,
                &["video", "gif", "animation", "ffmpeg"],
            ),
            vec![PortSpec::new(
                "input",
                "Video File",
                &["video/mp4", "video/webm", "video/avi", "video/mov"],
            )],
            vec![PortSpec::new("output", "GIF Animation", &["image/gif"])],
            vec![
                ParameterSpec {
                    ui_hints: json!({ "suffix": "s", "placeholder": "0" }),
                    ..number("start_time", "Start Time", 0.0, Some(0.0), None, false)
                },
                ParameterSpec {
                    ui_hints: json!({ "suffix": "s", "step": 0.1 }),
                    ..number("duration", "Duration", 5.0, Some(0.1), Some(30.0), false)
                },
                ParameterSpec {
                    ui_hints: json!({ "suffix": "fps" }),
                    ..number("fps", "Frame Rate", 15.0, Some(1.0), Some(30.0), false)
                },
                ParameterSpec {
                    ui_hints: json!({ "suffix": "px" }),
                    ..number("width", "Width", 480.0, Some(100.0), Some(1920.0), false)
                },
            ],
            json!({ "icon": "Film", "color": "#F97316" }),
        ),
    ]
}
