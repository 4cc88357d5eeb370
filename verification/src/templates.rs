//! Localized texts the user is asked to publish.
//!
//! Templates live at `<dir>/<step>/<network>/<kind>/<language>.txt` and are
//! compiled once at startup. Placeholders are `{username}` and `{user_id}`;
//! anything else in braces is rejected at compile time, so rendering a loaded
//! template always succeeds.

use crate::TemplateError;
use socialkyc_types::{KycStep, SocialNetwork, User};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// The text of the post itself.
    Post,
}

impl TemplateKind {
    pub const ALL: [Self; 1] = [Self::Post];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Username,
    UserId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Template {
    segments: Vec<Segment>,
}

impl Template {
    fn compile(source: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut rest = source;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| format!("unclosed brace at byte {}", source.len() - rest.len() + open))?;
            let field = match &after[..close] {
                "username" => Field::Username,
                "user_id" => Field::UserId,
                other => return Err(format!("unknown placeholder {{{other}}}")),
            };
            segments.push(Segment::Field(field));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(Self { segments })
    }

    fn render(&self, user: &User) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Field::Username) => out.push_str(&user.username),
                Segment::Field(Field::UserId) => out.push_str(user.id.as_str()),
            }
        }
        out
    }
}

type TemplateKey = (KycStep, SocialNetwork, TemplateKind);

pub struct TemplateStore {
    default_language: String,
    templates: HashMap<TemplateKey, HashMap<String, Template>>,
}

impl TemplateStore {
    /// Read and compile every template for `steps` x `networks`.
    ///
    /// Fails if any file cannot be read or compiled, or if some
    /// (step, network, kind) has no template in `default_language`.
    pub fn load(
        dir: &Path,
        steps: &[KycStep],
        networks: &[SocialNetwork],
        default_language: &str,
    ) -> Result<Self, TemplateError> {
        let mut templates = HashMap::new();
        let mut count = 0usize;

        for &step in steps {
            for &network in networks {
                for kind in TemplateKind::ALL {
                    let kind_dir = dir
                        .join(step.to_string())
                        .join(network.as_str())
                        .join(kind.as_str());
                    let by_language = load_languages(&kind_dir)?;
                    if !by_language.contains_key(default_language) {
                        return Err(TemplateError::MissingDefault {
                            step,
                            network,
                            kind: kind.as_str(),
                            language: default_language.to_string(),
                        });
                    }
                    count += by_language.len();
                    templates.insert((step, network, kind), by_language);
                }
            }
        }

        tracing::info!(
            dir = %dir.display(),
            templates = count,
            default_language,
            "templates loaded"
        );
        Ok(Self {
            default_language: default_language.to_string(),
            templates,
        })
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Render for `language`, falling back to the default language.
    pub fn render(
        &self,
        step: KycStep,
        network: SocialNetwork,
        kind: TemplateKind,
        language: &str,
        user: &User,
    ) -> Result<String, TemplateError> {
        let by_language =
            self.templates
                .get(&(step, network, kind))
                .ok_or(TemplateError::NotLoaded {
                    step,
                    network,
                    kind: kind.as_str(),
                })?;
        let template = by_language
            .get(language)
            .or_else(|| by_language.get(&self.default_language))
            .ok_or(TemplateError::NotLoaded {
                step,
                network,
                kind: kind.as_str(),
            })?;
        Ok(template.render(user))
    }
}

fn load_languages(kind_dir: &Path) -> Result<HashMap<String, Template>, TemplateError> {
    let entries = fs::read_dir(kind_dir).map_err(read_error(kind_dir))?;

    let mut by_language = HashMap::new();
    for entry in entries {
        let path = entry.map_err(read_error(kind_dir))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let Some(language) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let language = language.to_string();
        let source = fs::read_to_string(&path).map_err(read_error(&path))?;
        let template = Template::compile(source.trim_end_matches(['\r', '\n']))
            .map_err(|reason| TemplateError::Compile {
                path: path.clone(),
                reason,
            })?;
        by_language.insert(language, template);
    }
    Ok(by_language)
}

fn read_error(path: &Path) -> impl FnOnce(std::io::Error) -> TemplateError {
    let path: PathBuf = path.to_path_buf();
    move |source| TemplateError::Read { path, source }
}
