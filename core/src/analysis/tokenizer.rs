use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref LETTERS: Regex = Regex::new(r"(?u)\p{L}+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

pub(crate) const DEFAULT_STOPWORDS: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","can't","cannot","could","couldn't",
    "did","didn't","do","does","doesn't","doing","don't","down","during",
    "each","few","for","from","further",
    "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
    "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
    "let's","me","more","most","mustn't","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
    "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
    "under","until","up","very",
    "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
    "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
];

/// NFKC normalization followed by lowercasing.
pub fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

/// Word tokens (a letter followed by letters, digits, `_` or `'`) of already
/// normalized text.
pub fn words(normalized: &str) -> impl Iterator<Item = &str> {
    WORD.find_iter(normalized).map(|m| m.as_str())
}

/// Maximal runs of letters.
pub fn letter_runs(text: &str) -> impl Iterator<Item = &str> {
    LETTERS.find_iter(text).map(|m| m.as_str())
}

pub fn stem(token: &str) -> String {
    STEMMER.stem(token).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_words() {
        let n = normalize("Running, runner's run!");
        let w: Vec<&str> = words(&n).collect();
        assert_eq!(w, vec!["running", "runner's", "run"]);
        assert_eq!(stem("running"), "run");
    }

    #[test]
    fn letter_runs_split_on_digits() {
        let runs: Vec<&str> = letter_runs("abc123def").collect();
        assert_eq!(runs, vec!["abc", "def"]);
    }
}
