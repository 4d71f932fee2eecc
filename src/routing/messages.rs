//! Localized reply catalog.
//!
//! Templates marked as HTML are sent with Telegram's HTML parse mode; any
//! user-supplied value interpolated into them must be escaped first.

use super::Language;

/// Fixed replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Asks for a student ID.
    Welcome,
    /// Credential did not match.
    AuthFailed,
    /// Restricted topic.
    Restricted,
    /// The assistant had nothing to say.
    Fallback,
    /// The assistant could not be reached.
    TechnicalError,
    /// Sent while muted.
    Muted,
    /// Sent on the message that triggered the mute.
    RateLimited,
    /// Asks for an email after login.
    AskEmail,
    /// Email stored.
    EmailSaved,
    /// No certificate link on file.
    CertificateMissing,
    /// Command overview.
    Help,
    /// Language keyboard prompt.
    LanguagePrompt,
    /// A document was forwarded to staff.
    FileReceived,
    /// A document could not be forwarded.
    FileFailed,
}

impl Template {
    /// Returns true if the text uses HTML markup.
    #[must_use]
    pub const fn is_html(self) -> bool {
        matches!(self, Self::Help | Self::CertificateMissing)
    }

    /// Returns the reply text in the given language.
    #[must_use]
    pub const fn text(self, lang: Language) -> &'static str {
        use Language::{En, Fr, Ht};

        match (self, lang) {
            (Self::Welcome, Fr) => "🔐 Veuillez entrer votre identifiant étudiant pour continuer.",
            (Self::Welcome, Ht) => "🔐 Tanpri antre ID elèv ou pou kontinye.",
            (Self::Welcome, En) => "🔐 Please enter your student ID to continue.",

            (Self::AuthFailed, Fr) => "⛔ Identifiant invalide. Veuillez réessayer.",
            (Self::AuthFailed, Ht) => "⛔ ID pa valab. Tanpri eseye ankò.",
            (Self::AuthFailed, En) => "⛔ Invalid ID. Please try again.",

            (Self::Restricted, Fr) => "⚠️ Sujets spirituels interdits ici.",
            (Self::Restricted, Ht) => "⚠️ Sijè espirityèl pa pèmèt isit.",
            (Self::Restricted, En) => "⚠️ Spiritual topics are not allowed here.",

            (Self::Fallback, Fr) => "❓ Aucune réponse disponible. Essayez autre chose.",
            (Self::Fallback, Ht) => "❓ Pa gen repons. Tanpri eseye ankò.",
            (Self::Fallback, En) => "❓ No response found. Try something else.",

            (Self::TechnicalError, Fr) => "❌ Erreur technique. Veuillez réessayer plus tard.",
            (Self::TechnicalError, Ht) => "❌ Erè teknik. Tanpri eseye pita.",
            (Self::TechnicalError, En) => "❌ Technical error. Please try again later.",

            (Self::Muted, Fr) => "⏳ Veuillez patienter un moment.",
            (Self::Muted, Ht) => "⏳ Tanpri tann yon ti moman.",
            (Self::Muted, En) => "⏳ Please wait a moment.",

            (Self::RateLimited, Fr) => "⛔ Vous envoyez des messages trop rapidement.",
            (Self::RateLimited, Ht) => "⛔ W ap voye mesaj twò vit.",
            (Self::RateLimited, En) => "⛔ You're sending messages too quickly.",

            (Self::AskEmail, Fr) => "📧 Entrez votre e-mail pour recevoir les notifications :",
            (Self::AskEmail, Ht) => "📧 Antre imèl ou pou resevwa notifikasyon :",
            (Self::AskEmail, En) => "📧 Please enter your email to receive notifications:",

            (Self::EmailSaved, Fr) => "✅ Votre e-mail a été enregistré.",
            (Self::EmailSaved, Ht) => "✅ Imèl ou anrejistre.",
            (Self::EmailSaved, En) => "✅ Your email has been saved.",

            (Self::CertificateMissing, Fr) => {
                "❗ <b>Aucun certificat trouvé pour votre identifiant.</b>\n\n\
                 <b>Demande de certificat</b>\n\n\
                 1. <b>Vérifiez votre éligibilité</b>\n\
                 2. <b>Soumettez une demande à</b> info@academiesapienceuniverselle.org\n\
                 3. <b>Délai :</b> 7 jours ouvrables"
            }
            (Self::CertificateMissing, Ht) => {
                "❗ <b>Pa gen sètifika jwenn pou ID ou a.</b>\n\n\
                 <b>Demann pou sètifika</b>\n\n\
                 1. <b>Verifye kalifikasyon ou</b>\n\
                 2. <b>Voye demann nan</b> info@academiesapienceuniverselle.org\n\
                 3. <b>Tretman :</b> 7 jou travay"
            }
            (Self::CertificateMissing, En) => {
                "❗ <b>No certificate found for your ID.</b>\n\n\
                 <b>Requesting your certificate</b>\n\n\
                 1. <b>Check eligibility</b>\n\
                 2. <b>Send request to</b> info@academiesapienceuniverselle.org\n\
                 3. <b>Processing:</b> 7 business days"
            }

            (Self::Help, Fr) => {
                "📚 <b>Commandes disponibles :</b>\n\n\
                 - /start – Redémarrer la session\n\
                 - /help – Afficher ce menu d'aide\n\
                 - /language – Changer de langue\n\
                 - <i>certificat / diplôme / attestation</i> – Obtenez votre certificat\n\
                 - <i>transcript / schedule</i> – Demander des documents\n\
                 - <i>examens / paiement / vacances</i> – Dates importantes\n\n\
                 Si vous ne savez pas quoi écrire, posez simplement votre question."
            }
            (Self::Help, Ht) => {
                "📚 <b>Kòmand disponib :</b>\n\n\
                 - /start – Rekòmanse sesyon an\n\
                 - /help – Montre meni èd la\n\
                 - /language – Chanje lang\n\
                 - <i>sètifika / diplòm / atestasyon</i> – Jwenn sètifika ou\n\
                 - <i>transcript / schedule</i> – Mande dokiman\n\
                 - <i>egzamen / peyman / vakans</i> – Dat enpòtan\n\n\
                 Si ou pa sèten, jis poze kesyon ou."
            }
            (Self::Help, En) => {
                "📚 <b>Available commands:</b>\n\n\
                 - /start – Restart the session\n\
                 - /help – Show this help menu\n\
                 - /language – Change language\n\
                 - <i>certificate / certificat / sètifika</i> – Get your certificate\n\
                 - <i>transcript / schedule</i> – Request documents\n\
                 - <i>exam / payment / holiday</i> – Important dates\n\n\
                 If you're unsure, just type your question."
            }

            (Self::LanguagePrompt, _) => {
                "🌍 Choose your language / Chwazi lang ou / Choisissez votre langue:"
            }

            (Self::FileReceived, Fr) => "✅ Fichier reçu. Nous allons l'examiner rapidement.",
            (Self::FileReceived, Ht) => "✅ Nou resevwa dosye a. N ap gade l byento.",
            (Self::FileReceived, En) => "✅ File received. We'll review it shortly.",

            (Self::FileFailed, Fr) => "❌ Désolé, impossible de traiter ce fichier.",
            (Self::FileFailed, Ht) => "❌ Padon, nou pa t ka trete dosye a.",
            (Self::FileFailed, En) => "❌ Sorry, we could not process the file link.",
        }
    }
}

/// Greeting sent after a successful login. `name` must already be escaped
/// if the reply is sent as HTML.
#[must_use]
pub fn greeting(name: &str, lang: Language) -> String {
    match lang {
        Language::Fr => format!("✅ Bonjour {name}. Comment puis-je vous aider aujourd'hui ?"),
        Language::Ht => format!("✅ Bonjou {name}. Kijan mwen ka ede w jodi a ?"),
        Language::En => format!("✅ Hello {name}. How can I help you today?"),
    }
}

/// Reply carrying the student's certificate link.
#[must_use]
pub fn certificate_link(link: &str, lang: Language) -> String {
    match lang {
        Language::Fr => format!("📎 Voici votre certificat : {link}"),
        Language::Ht => format!("📎 Men sètifika ou : {link}"),
        Language::En => format!("📎 Here is your certificate: {link}"),
    }
}

/// Reply carrying a resource link.
#[must_use]
pub fn resource_link(keyword: &str, link: &str, lang: Language) -> String {
    match lang {
        Language::Fr => format!("📎 Voici votre {keyword} : {link}"),
        Language::Ht => format!("📎 Men {keyword} ou : {link}"),
        Language::En => format!("📎 Here is your {keyword}: {link}"),
    }
}

/// Confirmation after an explicit language change.
#[must_use]
pub fn language_set(lang: Language) -> String {
    let label = lang.button_label();
    match lang {
        Language::Fr => format!("✅ Langue définie sur {label}."),
        Language::Ht => format!("✅ Lang chwazi : {label}."),
        Language::En => format!("✅ Language set to {label}."),
    }
}

/// Header for a list of calendar dates.
#[must_use]
pub fn dates_header(topic: crate::config::DateTopic, lang: Language) -> &'static str {
    use crate::config::DateTopic::{Exam, Holiday, Payment};

    match (topic, lang) {
        (Exam, Language::Fr) => "📅 Dates des examens :",
        (Exam, Language::Ht) => "📅 Dat egzamen yo :",
        (Exam, Language::En) => "📅 Exam dates:",
        (Payment, Language::Fr) => "💳 Échéances de paiement :",
        (Payment, Language::Ht) => "💳 Dat pou peyman :",
        (Payment, Language::En) => "💳 Payment deadlines:",
        (Holiday, Language::Fr) => "🏖 Congés et vacances :",
        (Holiday, Language::Ht) => "🏖 Jou konje ak vakans :",
        (Holiday, Language::En) => "🏖 Holidays and breaks:",
    }
}

/// Reply when a calendar topic has no published dates.
#[must_use]
pub const fn no_dates(lang: Language) -> &'static str {
    match lang {
        Language::Fr => "📅 Aucune date n'est encore publiée. Réessayez bientôt.",
        Language::Ht => "📅 Poko gen dat pibliye. Eseye ankò pita.",
        Language::En => "📅 No dates have been published yet. Please check back soon.",
    }
}
