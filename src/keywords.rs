use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

const TECH_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "languages",
        &[
            "Python", "Java", "JavaScript", "TypeScript", "Go", "Rust", r"C\+\+", "C#", "Ruby",
            "PHP", "Swift", "Kotlin", "Scala", "R", "Julia",
        ],
    ),
    (
        "frontend",
        &[
            "React", "Vue", "Angular", "Svelte", r"Next\.js", "Nuxt", "HTML", "CSS", "Tailwind",
            "Bootstrap", "Webpack", "Vite", "Redux", "MobX",
        ],
    ),
    (
        "backend",
        &[
            r"Node\.js", "Django", "Flask", "FastAPI", "Spring", "Express", "Rails", "Laravel",
            r"\.NET", r"ASP\.NET", "GraphQL", "REST", "gRPC", "API",
        ],
    ),
    (
        "databases",
        &[
            "PostgreSQL", "MySQL", "MongoDB", "Redis", "Elasticsearch", "DynamoDB", "Cassandra",
            "Oracle", "SQL Server", "Neo4j", "ClickHouse",
        ],
    ),
    (
        "cloud",
        &[
            "AWS", "Azure", "GCP", "Google Cloud", "Kubernetes", "Docker", "Terraform",
            "CloudFormation", "Jenkins", "GitLab CI", "GitHub Actions", "CircleCI",
        ],
    ),
    (
        "data_ml",
        &[
            "Spark", "Hadoop", "Kafka", "Airflow", "TensorFlow", "PyTorch", "scikit-learn",
            "Pandas", "NumPy", "Jupyter", "MLflow", "Databricks",
        ],
    ),
    (
        "tools",
        &[
            "Git", "Linux", "Bash", "Agile", "Scrum", "CI/CD", "Microservices", "REST API",
            "OAuth", "JWT", "WebSocket",
        ],
    ),
];

const SOFT_SKILLS: &[&str] = &[
    "communication",
    "leadership",
    "collaboration",
    "teamwork",
    "problem-solving",
    "analytical",
    "mentoring",
    "ownership",
    "autonomy",
    "agile",
    "cross-functional",
    "stakeholder",
    "influence",
    "documentation",
    "presentation",
];

const STRONG_INDICATORS: &[&str] = &["required", "must have", "must-have", "essential", "critical"];
const PREFERRED_INDICATORS: &[&str] = &["preferred", "nice to have", "nice-to-have", "bonus", "plus"];

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "be", "been",
];

/// Requirement sentences shown per bucket in the text report.
const REPORT_REQUIREMENT_LIMIT: usize = 5;

static TECH_PATTERNS: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    TECH_KEYWORDS
        .iter()
        .map(|(category, terms)| {
            let patterns = terms
                .iter()
                .filter_map(|term| Regex::new(&format!(r"(?i)\b{}\b", term)).ok())
                .collect();
            (*category, patterns)
        })
        .collect()
});

static EXPERIENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(\d+)\+?\s*years?",
        r"(?i)(\d+)\+?\s*yrs?",
        r"(?i)\b(senior|junior|mid-level|staff|principal|lead)\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static SENTENCE_BREAK: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[.!?]\s+").ok());
static WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b[a-z]+\b").ok());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMatches {
    pub category: &'static str,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Requirements {
    pub required: Vec<String>,
    pub preferred: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JdAnalysis {
    pub tech_keywords: Vec<CategoryMatches>,
    pub experience_requirements: Vec<String>,
    pub soft_skills: Vec<&'static str>,
    pub requirements: Requirements,
    pub key_phrases: Vec<(String, usize)>,
}

/// Matched terms per category, in the text's own casing. Empty categories are omitted.
pub fn extract_tech_keywords(text: &str) -> Vec<CategoryMatches> {
    TECH_PATTERNS
        .iter()
        .filter_map(|(category, patterns)| {
            let terms: BTreeSet<String> = patterns
                .iter()
                .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_string()))
                .collect();
            if terms.is_empty() {
                None
            } else {
                Some(CategoryMatches {
                    category: *category,
                    terms: terms.into_iter().collect(),
                })
            }
        })
        .collect()
}

pub fn extract_experience_requirements(text: &str) -> Vec<String> {
    let found: BTreeSet<String> = EXPERIENCE_PATTERNS
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect();
    found.into_iter().collect()
}

pub fn extract_soft_skills(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    SOFT_SKILLS
        .iter()
        .copied()
        .filter(|skill| lower.contains(skill))
        .collect()
}

/// Sort sentences into required/preferred buckets. Required wins when both match.
pub fn categorize_requirements(text: &str) -> Requirements {
    let mut result = Requirements::default();
    let Some(splitter) = SENTENCE_BREAK.as_ref() else {
        return result;
    };

    for sentence in splitter.split(text) {
        let sentence = sentence.trim().trim_end_matches(['.', '!', '?']).trim_end();
        if sentence.is_empty() {
            continue;
        }
        let lower = sentence.to_lowercase();
        if STRONG_INDICATORS.iter().any(|i| lower.contains(i)) {
            result.required.push(sentence.to_string());
        } else if PREFERRED_INDICATORS.iter().any(|i| lower.contains(i)) {
            result.preferred.push(sentence.to_string());
        }
    }
    result
}

/// Most frequent bigrams and trigrams. Ties keep first-encountered order,
/// with all bigrams counted ahead of trigrams.
pub fn extract_key_phrases(text: &str, top_n: usize) -> Vec<(String, usize)> {
    let Some(word) = WORD.as_ref() else {
        return Vec::new();
    };
    let lower = text.to_lowercase();
    let words: Vec<&str> = word.find_iter(&lower).map(|m| m.as_str()).collect();
    let is_stop = |w: &str| STOP_WORDS.contains(&w);

    let bigrams = words
        .windows(2)
        .filter(|w| !w.iter().all(|t| is_stop(*t)))
        .map(|w| w.join(" "));
    let trigrams = words
        .windows(3)
        .filter(|w| !w.iter().all(|t| is_stop(*t)))
        .map(|w| w.join(" "));

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for phrase in bigrams.chain(trigrams) {
        match index.get(&phrase) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(phrase.clone(), counts.len());
                counts.push((phrase, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(top_n);
    counts
}

pub fn analyze(text: &str) -> JdAnalysis {
    JdAnalysis {
        tech_keywords: extract_tech_keywords(text),
        experience_requirements: extract_experience_requirements(text),
        soft_skills: extract_soft_skills(text),
        requirements: categorize_requirements(text),
        key_phrases: extract_key_phrases(text, 10),
    }
}

fn bullet(text: &str) -> String {
    let options = textwrap::Options::new(76)
        .initial_indent("  - ")
        .subsequent_indent("    ");
    textwrap::fill(text, options)
}

pub fn format_report(analysis: &JdAnalysis) -> String {
    let rule = "=".repeat(60);
    let mut out: Vec<String> = vec![rule.clone(), "JD KEYWORD ANALYSIS".to_string(), rule.clone()];

    out.push("\n## TECHNICAL SKILLS\n".to_string());
    if analysis.tech_keywords.is_empty() {
        out.push("  No specific technical keywords detected.\n".to_string());
    }
    for group in &analysis.tech_keywords {
        out.push(format!("### {}", group.category.to_uppercase()));
        out.extend(group.terms.iter().map(|t| format!("  - {}", t)));
        out.push(String::new());
    }

    out.push("## EXPERIENCE REQUIREMENTS\n".to_string());
    if analysis.experience_requirements.is_empty() {
        out.push("  No specific experience requirements detected.\n".to_string());
    } else {
        out.extend(analysis.experience_requirements.iter().map(|r| format!("  - {}", r)));
        out.push(String::new());
    }

    out.push("## SOFT SKILLS MENTIONED\n".to_string());
    if analysis.soft_skills.is_empty() {
        out.push("  No specific soft skills detected.\n".to_string());
    } else {
        out.extend(analysis.soft_skills.iter().map(|s| format!("  - {}", s)));
        out.push(String::new());
    }

    out.push("## REQUIREMENT STRENGTH\n".to_string());
    let buckets = [
        ("### REQUIRED (Must-have)", &analysis.requirements.required),
        ("### PREFERRED (Nice-to-have)", &analysis.requirements.preferred),
    ];
    for (heading, sentences) in buckets {
        if sentences.is_empty() {
            continue;
        }
        out.push(heading.to_string());
        out.extend(sentences.iter().take(REPORT_REQUIREMENT_LIMIT).map(|s| bullet(s)));
        out.push(String::new());
    }

    out.push("## KEY PHRASES (Most Common)\n".to_string());
    if !analysis.key_phrases.is_empty() {
        out.extend(
            analysis
                .key_phrases
                .iter()
                .map(|(phrase, count)| format!("  - '{}' (mentioned {}x)", phrase, count)),
        );
        out.push(String::new());
    }

    out.push(rule);
    out.join("\n")
}
