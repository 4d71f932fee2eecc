//! Keyword router for authenticated students.
//!
//! Rules are evaluated in a fixed priority order over the lowercased text;
//! the first rule whose keywords match produces the reply. Text no rule
//! claims is forwarded to the hosted assistant.

use std::collections::HashMap;

use teloxide::utils::html;

use super::Language;
use super::messages::{self, Template};
use crate::config::{DateTopic, FaqData};
use crate::gate::normalize_credential;

/// Topics that are refused outright.
const RESTRICTED_KEYWORDS: &[&str] = &[
    "ritual",
    "dream",
    "spiritual",
    "kabbalah",
    "initiation",
    "symbol",
    "meditation",
    "vision",
    "energy",
];

const CERTIFICATE_KEYWORDS: &[&str] = &[
    "certificate",
    "certificat",
    "sètifika",
    "attestation",
    "attestasyon",
    "diploma",
    "diplom",
    "diplôme",
];

const EXAM_KEYWORDS: &[&str] = &["exam", "examen", "egzamen"];
const PAYMENT_KEYWORDS: &[&str] = &["payment", "paiement", "peyman", "tuition", "frais"];
const HOLIDAY_KEYWORDS: &[&str] = &["holiday", "vacances", "vakans", "congé", "konje"];

/// Per-message facts the router needs about the sender.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    /// Reply language.
    pub language: Language,
    /// Student ID the user logged in with.
    pub student_id: Option<&'a str>,
    /// Whether an email is already on file.
    pub has_email: bool,
}

/// A reply ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message text.
    pub text: String,
    /// Whether `text` is HTML.
    pub html: bool,
}

impl Reply {
    /// Plain-text reply.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: false,
        }
    }

    /// Reply from a catalog template.
    #[must_use]
    pub fn template(template: Template, lang: Language) -> Self {
        Self {
            text: template.text(lang).to_owned(),
            html: template.is_html(),
        }
    }
}

/// What to do with a message that passed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Store the text as the user's email.
    CaptureEmail(String),
    /// Answer directly.
    Reply(Reply),
    /// Ask the hosted assistant.
    Forward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleAction {
    Restricted,
    Certificate,
    Resource { keyword: String, url: String },
    Calendar(DateTopic),
}

#[derive(Debug, Clone)]
struct Rule {
    name: String,
    keywords: Vec<String>,
    action: RuleAction,
}

impl Rule {
    fn new(name: impl Into<String>, keywords: &[&str], action: RuleAction) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            action,
        }
    }

    fn matches(&self, lower: &str) -> bool {
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

/// Priority-ordered keyword router.
#[derive(Debug, Clone)]
pub struct Router {
    rules: Vec<Rule>,
    certificates: HashMap<String, String>,
    faq: FaqData,
}

impl Router {
    /// Builds the rule list from the loaded data.
    ///
    /// Order: restricted topics, certificates, resources (in file order),
    /// then calendar topics.
    #[must_use]
    pub fn new(certificates: HashMap<String, String>, faq: FaqData) -> Self {
        let mut rules = vec![
            Rule::new("restricted", RESTRICTED_KEYWORDS, RuleAction::Restricted),
            Rule::new("certificate", CERTIFICATE_KEYWORDS, RuleAction::Certificate),
        ];

        for resource in &faq.resources {
            let keyword = resource.keyword.trim().to_lowercase();
            if keyword.is_empty() {
                continue;
            }
            rules.push(Rule::new(
                format!("resource:{keyword}"),
                &[keyword.as_str()],
                RuleAction::Resource {
                    keyword: keyword.clone(),
                    url: resource.url.clone(),
                },
            ));
        }

        for topic in DateTopic::ALL {
            let keywords = match topic {
                DateTopic::Exam => EXAM_KEYWORDS,
                DateTopic::Payment => PAYMENT_KEYWORDS,
                DateTopic::Holiday => HOLIDAY_KEYWORDS,
            };
            rules.push(Rule::new(
                format!("calendar:{topic}"),
                keywords,
                RuleAction::Calendar(topic),
            ));
        }

        let certificates = certificates
            .into_iter()
            .map(|(id, url)| (normalize_credential(&id), url))
            .collect();

        Self {
            rules,
            certificates,
            faq,
        }
    }

    /// Routes one message from an authenticated user.
    #[must_use]
    pub fn route(&self, text: &str, ctx: &RouteContext<'_>) -> Route {
        let text = text.trim();

        if !ctx.has_email && text.contains('@') {
            return Route::CaptureEmail(text.to_owned());
        }

        let lower = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lower))
            .map_or(Route::Forward, |rule| Route::Reply(self.respond(&rule.action, ctx)))
    }

    /// Names of the rules in evaluation order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name.as_str()).collect()
    }

    fn respond(&self, action: &RuleAction, ctx: &RouteContext<'_>) -> Reply {
        let lang = ctx.language;

        match action {
            RuleAction::Restricted => Reply::template(Template::Restricted, lang),
            RuleAction::Certificate => ctx
                .student_id
                .map(normalize_credential)
                .and_then(|id| self.certificates.get(&id))
                .map_or_else(
                    || Reply::template(Template::CertificateMissing, lang),
                    |link| Reply::plain(messages::certificate_link(link, lang)),
                ),
            RuleAction::Resource { keyword, url } => {
                Reply::plain(messages::resource_link(keyword, url, lang))
            }
            RuleAction::Calendar(topic) => self.calendar_reply(*topic, lang),
        }
    }

    fn calendar_reply(&self, topic: DateTopic, lang: Language) -> Reply {
        let dates = self.faq.dates_for(topic);
        if dates.is_empty() {
            return Reply::plain(messages::no_dates(lang));
        }

        let mut lines = vec![format!("<b>{}</b>", html::escape(messages::dates_header(topic, lang)))];
        for entry in dates {
            lines.push(format!(
                "• {}: {}",
                entry.date.format("%Y-%m-%d"),
                html::escape(&entry.label)
            ));
        }

        Reply {
            text: lines.join("\n"),
            html: true,
        }
    }
}
