use crate::core::conversation::Language;

/// User-facing labels for notices and titles.
#[derive(Debug, Clone, Copy)]
pub struct Strings {
    pub new_conversation: &'static str,
    pub conversation_created: &'static str,
    pub retry: &'static str,
    pub error: &'static str,
    pub success: &'static str,
    pub nothing_to_export: &'static str,
    pub exported: &'static str,
    pub generating: &'static str,
    pub no_conversations: &'static str,
}

const FR: Strings = Strings {
    new_conversation: "Nouvelle conversation",
    conversation_created: "Nouvelle conversation créée",
    retry: "Réessayer",
    error: "Erreur",
    success: "Succès",
    nothing_to_export: "Aucune conversation à exporter",
    exported: "Conversation exportée",
    generating: "GEN AI génère la réponse...",
    no_conversations: "Commencez une conversation",
};

const EN: Strings = Strings {
    new_conversation: "New conversation",
    conversation_created: "New conversation created",
    retry: "Retry",
    error: "Error",
    success: "Success",
    nothing_to_export: "No conversation to export",
    exported: "Conversation exported",
    generating: "Generating response...",
    no_conversations: "Start a conversation",
};

pub fn strings(language: Language) -> &'static Strings {
    match language {
        Language::Fr => &FR,
        Language::En => &EN,
    }
}
