//! Session state and its transition function
//!
//! [`SessionState::apply`] is pure: it takes the current state and an
//! [`Action`] and returns the next state plus the [`Effect`]s the controller
//! has to carry out (start or stop the status timer, issue provider
//! requests, publish events). Results of asynchronous requests come back as
//! actions tagged with the [`RequestToken`] of the request that produced
//! them; a token that is no longer active makes the action a no-op.

use crate::error::Error;
use crate::markdown::{render_article_markdown, render_outline_markdown};
use crate::types::{
    ArticleContent, ArtifactKind, Event, Outline, Phase, ProviderSelection, RecordId,
    RequestToken, SavedArticle, SavedMarkdown, SavedOutline,
};

/// Identifiers of saved records currently open for editing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditingIds {
    /// Saved outline being edited
    pub outline: Option<RecordId>,
    /// Saved article being edited
    pub article: Option<RecordId>,
    /// Saved markdown document being edited
    pub markdown: Option<RecordId>,
}

/// Everything the pipeline knows about the current session
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub(crate) phase: Phase,
    pub(crate) topic: String,
    pub(crate) outline: Option<Outline>,
    pub(crate) article: ArticleContent,
    pub(crate) current_section: Option<String>,
    pub(crate) status_message: Option<String>,
    pub(crate) error: Option<String>,
    pub(crate) markdown: String,
    pub(crate) editing: EditingIds,
    pub(crate) selection: ProviderSelection,
    pub(crate) active_request: Option<RequestToken>,
    pub(crate) next_token: u64,
}

/// Inputs to the state machine
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Start outline generation for a topic
    Submit {
        /// Topic or working title
        topic: String,
        /// First advisory status message, if any
        status: Option<String>,
    },
    /// The status timer moved on to the next message
    StatusAdvanced {
        /// Outline request the timer belongs to
        token: RequestToken,
        /// Message to show
        message: String,
    },
    /// The outline request finished
    OutlineResolved {
        /// Request that produced the result
        token: RequestToken,
        /// Parsed outline, or the user-facing failure message
        result: std::result::Result<Outline, String>,
    },
    /// Replace the outline title
    EditTitle(String),
    /// Replace one section heading
    EditSectionHeading {
        /// Section position
        index: usize,
        /// New heading
        heading: String,
    },
    /// Replace one section's bullets from newline-separated text
    EditBullets {
        /// Section position
        index: usize,
        /// One bullet per line
        text: String,
    },
    /// Start generating every section of the held outline
    GenerateArticle,
    /// Generation of one section began
    SectionStarted {
        /// Article request
        token: RequestToken,
        /// Section position
        index: usize,
    },
    /// The current section's accumulated body changed
    SectionProgress {
        /// Article request
        token: RequestToken,
        /// Accumulated body so far
        body: String,
    },
    /// The current section finished
    SectionCompleted {
        /// Article request
        token: RequestToken,
    },
    /// The current section failed; remaining sections are abandoned
    SectionFailed {
        /// Article request
        token: RequestToken,
        /// User-facing failure message
        error: String,
    },
    /// Every section finished
    ArticleCompleted {
        /// Article request
        token: RequestToken,
    },
    /// Replace the body of one generated section
    EditArticleSection {
        /// Section heading
        heading: String,
        /// New body
        body: String,
    },
    /// Return to idle, discarding the session
    Reset,
    /// Close the outline being edited without saving
    CancelEdit,
    /// Open a saved outline for editing
    LoadOutline(SavedOutline),
    /// Open a saved article for editing
    LoadArticle(SavedArticle),
    /// Open a saved markdown document for editing
    LoadMarkdown(SavedMarkdown),
    /// Fill the markdown buffer from the held outline
    RenderOutlineMarkdown,
    /// Fill the markdown buffer from the generated article and close the article
    RenderArticleMarkdown,
    /// Replace the markdown buffer
    EditMarkdown(String),
    /// The held outline was persisted
    OutlineSaved {
        /// Record id
        id: RecordId,
        /// Whether an existing record was updated
        updated: bool,
        /// Whether to leave the session afterwards
        close: bool,
    },
    /// The held article was persisted
    ArticleSaved {
        /// Record id
        id: RecordId,
        /// Whether an existing record was updated
        updated: bool,
        /// Whether to leave the session afterwards
        close: bool,
    },
    /// The markdown buffer was persisted
    MarkdownSaved {
        /// Record id
        id: RecordId,
        /// Whether an existing record was updated
        updated: bool,
    },
    /// A saved record was deleted
    RecordDeleted {
        /// Artifact kind
        kind: ArtifactKind,
        /// Record id
        id: RecordId,
    },
    /// Switch provider path
    SetSelection(ProviderSelection),
}

/// Work the controller performs after a transition
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Start the advisory status timer for an outline request
    StartStatusRotation {
        /// Outline request
        token: RequestToken,
    },
    /// Stop the advisory status timer, if running
    CancelStatusRotation,
    /// Ask the provider for an outline
    RequestOutline {
        /// Request token
        token: RequestToken,
        /// Topic
        topic: String,
        /// Provider path
        selection: ProviderSelection,
    },
    /// Generate every section of an outline, in order
    RequestArticle {
        /// Request token
        token: RequestToken,
        /// Snapshot of the outline at start
        outline: Outline,
        /// Provider path
        selection: ProviderSelection,
    },
    /// Publish an event
    Emit(Event),
}

/// How an action was handled
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// State changed (or was confirmed) as requested
    Applied,
    /// Nothing to do: duplicate request or result of a superseded request
    Ignored(&'static str),
    /// The action is invalid in the current state
    Rejected(String),
}

/// Result of one transition
#[derive(Clone, Debug)]
pub struct Step {
    /// Next state
    pub state: SessionState,
    /// Effects to perform, in order
    pub effects: Vec<Effect>,
    /// How the action was handled
    pub outcome: Outcome,
}

impl SessionState {
    /// Fresh idle session using a provider path
    pub fn new(selection: ProviderSelection) -> Self {
        Self {
            selection,
            ..Self::default()
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Topic of the current session
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Outline being worked on
    pub fn outline(&self) -> Option<&Outline> {
        self.outline.as_ref()
    }

    /// Generated section bodies
    pub fn article(&self) -> &ArticleContent {
        &self.article
    }

    /// Heading of the section being generated
    pub fn current_section(&self) -> Option<&str> {
        self.current_section.as_deref()
    }

    /// Advisory status text shown while the outline is generated
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Message of the last failure
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Markdown editor buffer
    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    /// Saved records open for editing
    pub fn editing(&self) -> &EditingIds {
        &self.editing
    }

    /// Provider path
    pub fn selection(&self) -> ProviderSelection {
        self.selection
    }

    /// Request whose results are currently accepted
    pub fn active_request(&self) -> Option<RequestToken> {
        self.active_request
    }

    /// Apply one action
    ///
    /// An action that is ignored or rejected returns the state unchanged and
    /// no effects.
    pub fn apply(mut self, action: Action) -> Step {
        let mut effects = Vec::new();
        let outcome = self.reduce(action, &mut effects);
        if !matches!(outcome, Outcome::Applied) {
            effects.clear();
        }
        Step {
            state: self,
            effects,
            outcome,
        }
    }

    fn reduce(&mut self, action: Action, fx: &mut Vec<Effect>) -> Outcome {
        match action {
            Action::Submit { topic, status } => {
                if self.phase.is_generating() {
                    return Outcome::Ignored("a generation is already in flight");
                }
                let topic = topic.trim();
                if topic.is_empty() {
                    return Outcome::Rejected("topic is empty".to_string());
                }

                let token = self.issue_token();
                self.topic = topic.to_string();
                self.outline = None;
                self.article = ArticleContent::new();
                self.current_section = None;
                self.error = None;
                self.editing.outline = None;
                self.editing.article = None;
                self.status_message = status.clone();
                self.enter(Phase::GeneratingOutline, fx);
                fx.push(Effect::StartStatusRotation { token });
                if let Some(message) = status {
                    fx.push(Effect::Emit(Event::StatusMessage { message }));
                }
                fx.push(Effect::RequestOutline {
                    token,
                    topic: self.topic.clone(),
                    selection: self.selection,
                });
                Outcome::Applied
            }

            Action::StatusAdvanced { token, message } => {
                if !self.is_active(token, Phase::GeneratingOutline) {
                    return Outcome::Ignored("status tick for a finished request");
                }
                self.status_message = Some(message.clone());
                fx.push(Effect::Emit(Event::StatusMessage { message }));
                Outcome::Applied
            }

            Action::OutlineResolved { token, result } => {
                if !self.is_active(token, Phase::GeneratingOutline) {
                    return Outcome::Ignored("outline result for a superseded request");
                }
                fx.push(Effect::CancelStatusRotation);
                self.status_message = None;
                self.active_request = None;
                match result {
                    Ok(outline) => {
                        let title = outline.title.clone();
                        let sections = outline.sections.len();
                        self.outline = Some(outline);
                        self.enter(Phase::OutlineReady, fx);
                        fx.push(Effect::Emit(Event::OutlineReady { title, sections }));
                    }
                    Err(error) => {
                        self.outline = None;
                        self.error = Some(error.clone());
                        self.enter(Phase::Error, fx);
                        fx.push(Effect::Emit(Event::GenerationFailed { error }));
                    }
                }
                Outcome::Applied
            }

            Action::EditTitle(title) => match self.editable_outline() {
                Ok(outline) => {
                    outline.title = title;
                    Outcome::Applied
                }
                Err(outcome) => outcome,
            },

            Action::EditSectionHeading { index, heading } => {
                let outline = match self.editable_outline() {
                    Ok(outline) => outline,
                    Err(outcome) => return outcome,
                };
                if index >= outline.sections.len() {
                    return Outcome::Rejected(format!("no section at position {index}"));
                }
                let duplicate = outline
                    .sections
                    .iter()
                    .enumerate()
                    .any(|(i, s)| i != index && s.heading == heading);
                if duplicate {
                    return Outcome::Rejected(format!(
                        "another section is already headed '{heading}'"
                    ));
                }
                outline.sections[index].heading = heading;
                Outcome::Applied
            }

            Action::EditBullets { index, text } => {
                let outline = match self.editable_outline() {
                    Ok(outline) => outline,
                    Err(outcome) => return outcome,
                };
                let Some(section) = outline.sections.get_mut(index) else {
                    return Outcome::Rejected(format!("no section at position {index}"));
                };
                section.bullets = text.split('\n').map(str::to_string).collect();
                Outcome::Applied
            }

            Action::GenerateArticle => {
                if self.phase.is_generating() {
                    return Outcome::Ignored("a generation is already in flight");
                }
                let outline = match (&self.outline, self.phase) {
                    (Some(outline), Phase::OutlineReady | Phase::ArticleReady | Phase::Error) => {
                        outline.clone()
                    }
                    _ => {
                        return Outcome::Rejected("there is no outline to generate from".to_string());
                    }
                };
                if let Err(e) = outline.validate() {
                    return Outcome::Rejected(validation_message(e));
                }

                let token = self.issue_token();
                self.article = ArticleContent::new();
                self.markdown.clear();
                self.error = None;
                self.current_section = None;
                self.enter(Phase::GeneratingArticle, fx);
                fx.push(Effect::RequestArticle {
                    token,
                    outline,
                    selection: self.selection,
                });
                Outcome::Applied
            }

            Action::SectionStarted { token, index } => {
                if !self.is_active(token, Phase::GeneratingArticle) {
                    return Outcome::Ignored("section start for a superseded request");
                }
                let Some(outline) = &self.outline else {
                    return Outcome::Ignored("no outline held");
                };
                let Some(section) = outline.sections.get(index) else {
                    return Outcome::Ignored("section index out of range");
                };
                let heading = section.heading.clone();
                let total = outline.sections.len();
                self.current_section = Some(heading.clone());
                fx.push(Effect::Emit(Event::SectionStarted {
                    heading,
                    index,
                    total,
                }));
                Outcome::Applied
            }

            Action::SectionProgress { token, body } => {
                if !self.is_active(token, Phase::GeneratingArticle) {
                    return Outcome::Ignored("section progress for a superseded request");
                }
                let Some(heading) = self.current_section.clone() else {
                    return Outcome::Ignored("no section in progress");
                };
                self.article.insert(heading.clone(), body.clone());
                fx.push(Effect::Emit(Event::SectionProgress {
                    heading,
                    content: body,
                }));
                Outcome::Applied
            }

            Action::SectionCompleted { token } => {
                if !self.is_active(token, Phase::GeneratingArticle) {
                    return Outcome::Ignored("section completion for a superseded request");
                }
                let Some(heading) = self.current_section.take() else {
                    return Outcome::Ignored("no section in progress");
                };
                if !self.article.contains(&heading) {
                    self.article.insert(heading.clone(), String::new());
                }
                fx.push(Effect::Emit(Event::SectionCompleted { heading }));
                Outcome::Applied
            }

            Action::SectionFailed { token, error } => {
                if !self.is_active(token, Phase::GeneratingArticle) {
                    return Outcome::Ignored("section failure for a superseded request");
                }
                // Streamed text of the failed section stays in the article
                self.current_section = None;
                self.active_request = None;
                self.error = Some(error.clone());
                self.enter(Phase::Error, fx);
                fx.push(Effect::Emit(Event::GenerationFailed { error }));
                Outcome::Applied
            }

            Action::ArticleCompleted { token } => {
                if !self.is_active(token, Phase::GeneratingArticle) {
                    return Outcome::Ignored("completion for a superseded request");
                }
                self.active_request = None;
                self.current_section = None;
                self.enter(Phase::ArticleReady, fx);
                fx.push(Effect::Emit(Event::ArticleComplete {
                    sections: self.article.len(),
                }));
                Outcome::Applied
            }

            Action::EditArticleSection { heading, body } => {
                if self.phase != Phase::ArticleReady {
                    return Outcome::Rejected(
                        "article sections can only be edited once generation has finished"
                            .to_string(),
                    );
                }
                let known = self
                    .outline
                    .as_ref()
                    .is_some_and(|o| o.section(&heading).is_some());
                if !known {
                    return Outcome::Rejected(format!("the outline has no section '{heading}'"));
                }
                self.article.insert(heading, body);
                Outcome::Applied
            }

            Action::Reset => {
                fx.push(Effect::CancelStatusRotation);
                let before = self.phase;
                *self = Self {
                    selection: self.selection,
                    next_token: self.next_token,
                    ..Self::default()
                };
                if before != Phase::Idle {
                    fx.push(Effect::Emit(Event::PhaseChanged {
                        from: before,
                        to: Phase::Idle,
                    }));
                }
                fx.push(Effect::Emit(Event::Reset));
                Outcome::Applied
            }

            Action::CancelEdit => {
                if self.phase.is_generating() {
                    return Outcome::Ignored("a generation is in flight");
                }
                self.editing.outline = None;
                self.editing.article = None;
                self.outline = None;
                self.article = ArticleContent::new();
                self.topic.clear();
                self.markdown.clear();
                self.error = None;
                self.enter(Phase::Idle, fx);
                Outcome::Applied
            }

            Action::LoadOutline(saved) => {
                self.supersede(fx);
                self.topic = saved.outline.title.clone();
                self.outline = Some(saved.outline);
                self.article = ArticleContent::new();
                self.editing.outline = Some(saved.id);
                self.editing.article = None;
                self.enter(Phase::OutlineReady, fx);
                Outcome::Applied
            }

            Action::LoadArticle(saved) => {
                self.supersede(fx);
                self.topic = saved.outline.title.clone();
                self.outline = Some(saved.outline);
                self.article = ArticleContent::from_parts(&saved.content);
                self.editing.article = Some(saved.id);
                self.editing.outline = None;
                self.markdown.clear();
                self.enter(Phase::ArticleReady, fx);
                Outcome::Applied
            }

            Action::LoadMarkdown(saved) => {
                self.supersede(fx);
                self.markdown = saved.content;
                self.editing.markdown = Some(saved.id);
                self.editing.outline = None;
                self.editing.article = None;
                self.outline = None;
                self.article = ArticleContent::new();
                self.enter(Phase::Idle, fx);
                Outcome::Applied
            }

            Action::RenderOutlineMarkdown => {
                if self.phase.is_generating() {
                    return Outcome::Rejected("a generation is in flight".to_string());
                }
                let Some(outline) = &self.outline else {
                    return Outcome::Rejected("there is no outline to render".to_string());
                };
                self.markdown = render_outline_markdown(outline);
                Outcome::Applied
            }

            Action::RenderArticleMarkdown => {
                if self.phase != Phase::ArticleReady {
                    return Outcome::Rejected("there is no finished article to render".to_string());
                }
                let Some(outline) = self.outline.take() else {
                    return Outcome::Rejected("there is no finished article to render".to_string());
                };
                self.markdown = render_article_markdown(&outline, &self.article);
                self.article = ArticleContent::new();
                self.editing.article = None;
                self.editing.outline = None;
                self.enter(Phase::Idle, fx);
                Outcome::Applied
            }

            Action::EditMarkdown(text) => {
                self.markdown = text;
                Outcome::Applied
            }

            Action::OutlineSaved { id, updated, close } => {
                fx.push(Effect::Emit(Event::Saved {
                    kind: ArtifactKind::Outline,
                    id: id.clone(),
                    updated,
                }));
                if close {
                    self.close_session(fx);
                } else {
                    self.editing.outline = Some(id);
                }
                Outcome::Applied
            }

            Action::ArticleSaved { id, updated, close } => {
                fx.push(Effect::Emit(Event::Saved {
                    kind: ArtifactKind::Article,
                    id: id.clone(),
                    updated,
                }));
                if close {
                    self.close_session(fx);
                } else {
                    self.editing.article = Some(id);
                }
                Outcome::Applied
            }

            Action::MarkdownSaved { id, updated } => {
                fx.push(Effect::Emit(Event::Saved {
                    kind: ArtifactKind::Markdown,
                    id,
                    updated,
                }));
                self.editing.markdown = None;
                self.markdown.clear();
                Outcome::Applied
            }

            Action::RecordDeleted { kind, id } => {
                let editing = match kind {
                    ArtifactKind::Outline => &mut self.editing.outline,
                    ArtifactKind::Article => &mut self.editing.article,
                    ArtifactKind::Markdown => &mut self.editing.markdown,
                };
                if editing.as_ref() == Some(&id) {
                    *editing = None;
                }
                fx.push(Effect::Emit(Event::Deleted { kind, id }));
                Outcome::Applied
            }

            Action::SetSelection(selection) => {
                if self.phase.is_generating() {
                    return Outcome::Rejected(
                        "the provider cannot be switched while generating".to_string(),
                    );
                }
                self.selection = selection;
                Outcome::Applied
            }
        }
    }

    fn issue_token(&mut self) -> RequestToken {
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        self.active_request = Some(token);
        token
    }

    fn is_active(&self, token: RequestToken, phase: Phase) -> bool {
        self.phase == phase && self.active_request == Some(token)
    }

    fn enter(&mut self, phase: Phase, fx: &mut Vec<Effect>) {
        if self.phase != phase {
            fx.push(Effect::Emit(Event::PhaseChanged {
                from: self.phase,
                to: phase,
            }));
            self.phase = phase;
        }
    }

    fn editable_outline(&mut self) -> Result<&mut Outline, Outcome> {
        if self.phase != Phase::OutlineReady {
            return Err(Outcome::Rejected(
                "the outline can only be edited while it is ready".to_string(),
            ));
        }
        self.outline
            .as_mut()
            .ok_or_else(|| Outcome::Rejected("there is no outline to edit".to_string()))
    }

    /// Drop any in-flight request so its results are discarded on arrival
    fn supersede(&mut self, fx: &mut Vec<Effect>) {
        if self.phase.is_generating() {
            fx.push(Effect::CancelStatusRotation);
        }
        self.active_request = None;
        self.current_section = None;
        self.status_message = None;
        self.error = None;
    }

    /// Leave the top-level flow after a closing save
    fn close_session(&mut self, fx: &mut Vec<Effect>) {
        self.editing.outline = None;
        self.editing.article = None;
        self.outline = None;
        self.article = ArticleContent::new();
        self.topic.clear();
        self.error = None;
        self.enter(Phase::Idle, fx);
    }
}

fn validation_message(error: Error) -> String {
    match error {
        Error::Validation(message) => message,
        other => other.to_string(),
    }
}
