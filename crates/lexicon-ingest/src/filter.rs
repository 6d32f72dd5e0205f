//! Stopword and common-word filtering for extraction candidates.

use std::collections::HashSet;

/// Function words that never make useful vocabulary.
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "may", "me", "might", "more", "must", "my", "myself", "neither", "no", "nor",
    "not", "of", "off", "on", "once", "one", "or", "our", "ours", "ourselves", "out", "over",
    "shall", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "upon", "us", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "whose", "why", "will", "with", "within", "without", "would", "you",
    "your", "yours", "yourself", "yourselves",
];

/// High-frequency English words with no genre flavor.
const COMMON_WORDS: &[&str] = &[
    // verbs
    "say", "said", "get", "make", "made", "know", "take", "see", "come", "think", "look",
    "want", "give", "use", "find", "tell", "ask", "work", "seem", "feel", "try", "leave",
    "call", "keep", "let", "begin", "show", "hear", "play", "run", "move", "live", "believe",
    "hold", "bring", "happen", "write", "provide", "sit", "stand", "lose", "pay", "meet",
    "include", "continue", "set", "learn", "change", "lead", "understand", "watch", "follow",
    "stop", "create", "speak", "read", "allow", "add", "spend", "grow", "open", "walk", "win",
    "offer", "remember", "love", "consider", "appear", "buy", "wait", "serve", "die", "send",
    "expect", "build", "stay", "fall", "cut", "reach", "kill", "remain", "suggest", "raise",
    "pass", "sell", "require", "report", "decide", "pull",
    // nouns
    "people", "year", "way", "day", "man", "thing", "woman", "life", "child", "world",
    "school", "state", "family", "student", "group", "country", "problem", "hand", "part",
    "place", "case", "week", "company", "system", "program", "question", "government",
    "number", "night", "point", "home", "water", "room", "mother", "area", "money", "story",
    "fact", "month", "lot", "right", "study", "book", "eye", "job", "word", "business",
    "issue", "side", "kind", "head", "house", "service", "friend", "father", "power", "hour",
    "game", "line", "end", "member", "law", "car", "city", "community", "name", "team",
    "minute", "idea", "kid", "body", "information", "back", "parent", "face", "others",
    "level", "office", "door", "health", "person", "art", "war", "history", "party", "result",
    "morning", "reason", "research", "girl", "guy", "moment", "air", "teacher", "force",
    "education", "foot", "boy", "age", "policy", "process", "music", "market", "sense",
    "nation", "plan", "interest", "death", "experience", "effect", "class", "control", "care",
    "field", "role", "effort", "rate", "heart", "leader", "light", "voice", "wife", "mind",
    "difference", "period", "building", "action", "model", "course", "century", "road",
    "table", "form", "ground", "street", "view", "event", "picture", "project", "center",
    "value", "type", "paper", "material", "order", "stage", "size", "town", "attention",
    "chance", "structure", "cost", "situation", "society", "data", "range", "test", "deal",
    // adjectives
    "good", "new", "first", "last", "long", "great", "little", "own", "other", "old", "big",
    "high", "different", "small", "large", "next", "early", "young", "important", "few",
    "public", "bad", "same", "able", "human", "local", "sure", "free", "real", "best",
    "better", "hard", "special", "easy", "clear", "recent", "certain", "personal", "red",
    "difficult", "available", "likely", "short", "single", "current", "wrong", "private",
    "past", "fine", "common", "poor", "natural", "similar", "hot", "dead", "central", "happy",
    "serious", "ready", "simple", "left", "general", "blue", "late", "possible", "full",
    "close", "necessary", "low", "white", "true", "strong", "various", "whole", "cold",
    "final", "main", "green", "nice", "huge",
    // adverbs and others
    "just", "also", "now", "only", "very", "well", "even", "most", "then", "still", "really",
    "already", "much", "never", "always", "often", "however", "away", "again", "actually",
    "else", "quite", "rather", "probably", "perhaps", "maybe", "yet", "though", "enough",
    "almost", "ever", "together", "soon", "later", "usually", "sometimes", "suddenly",
];

#[derive(Debug, Clone)]
pub struct TermFilter {
    function_words: HashSet<&'static str>,
    stopwords: HashSet<&'static str>,
}

impl Default for TermFilter {
    fn default() -> Self {
        Self {
            function_words: STOPWORDS.iter().copied().collect(),
            stopwords: STOPWORDS.iter().chain(COMMON_WORDS).copied().collect(),
        }
    }
}

impl TermFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Articles, pronouns, prepositions and the like. Narrower than the
    /// full filter: `Mind` is common on its own but fine inside `Mind Flayer`.
    pub fn is_function_word(&self, word: &str) -> bool {
        self.function_words.contains(word.to_lowercase().as_str())
    }

    /// False for empty, very short (two characters or fewer), all-digit and
    /// stop/common terms, and for phrases made only of such words.
    pub fn should_keep(&self, term: &str) -> bool {
        let lower = term.trim().to_lowercase();
        if lower.is_empty() || lower.chars().count() <= 2 {
            return false;
        }
        if lower.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        if self.stopwords.contains(lower.as_str()) {
            return false;
        }
        let words: Vec<&str> = lower.split_whitespace().collect();
        if words.len() > 1 && words.iter().all(|w| self.stopwords.contains(w)) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_short_numeric_and_common_terms() {
        let filter = TermFilter::new();
        assert!(!filter.should_keep(""));
        assert!(!filter.should_keep("ox"));
        assert!(!filter.should_keep("1234"));
        assert!(!filter.should_keep("The"));
        assert!(!filter.should_keep("people"));
        assert!(filter.should_keep("Wyvern"));
    }

    #[test]
    fn phrases_need_one_content_word() {
        let filter = TermFilter::new();
        assert!(!filter.should_keep("the other"));
        assert!(filter.should_keep("the obsidian"));
    }
}
