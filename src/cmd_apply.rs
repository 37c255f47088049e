use std::fs;
use std::path::PathBuf;
use std::process;

use argh::FromArgs;
use soundlaw::language::parse_graphs_list;
use soundlaw::{apply_ruleset, parse_ruleset_verbose, CategoryStore, Word};

/// exit code for malformed input of any kind
const EXIT_PARSE: i32 = 2;
/// exit code for unreadable files
const EXIT_IO: i32 = 3;

#[derive(FromArgs)]
/// Apply a ruleset file to a word list and print the transformed lexicon
#[argh(subcommand, name = "apply")]
pub struct Apply {
    /// graphs file: separator character first, then polygraphs
    #[argh(option, short = 'g')]
    graphs: PathBuf,

    /// categories file, one definition per line
    #[argh(option, short = 'c')]
    cats: PathBuf,

    /// ruleset file
    #[argh(option, short = 'r')]
    rules: PathBuf,

    /// word list, one word per line
    #[argh(option, short = 'w')]
    words: PathBuf,
}

fn read(path: &PathBuf) -> String {
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            process::exit(EXIT_IO);
        }
    }
}

impl Apply {
    pub fn run(self) {
        let graphs_text = read(&self.graphs);
        let cats_text = read(&self.cats);
        let rules_text = read(&self.rules);
        let words_text = read(&self.words);

        let graphs = match parse_graphs_list(&graphs_text) {
            Ok(g) => g,
            Err(e) => {
                eprintln!("Error in graphs file: {e}");
                process::exit(EXIT_PARSE);
            }
        };
        let mut cats = match CategoryStore::from_lines(&cats_text) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error in categories file: {e}");
                process::exit(EXIT_PARSE);
            }
        };

        let (rules, diagnostics) = parse_ruleset_verbose(&rules_text, &mut cats, &graphs);
        if !diagnostics.is_empty() {
            for diag in &diagnostics {
                eprintln!("Error in ruleset: {diag}");
            }
            process::exit(EXIT_PARSE);
        }

        let words: Vec<Word> = words_text
            .lines()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(|w| Word::parse(w, &graphs))
            .collect();

        // partial output is discarded on error: render only after every
        // word came through
        match apply_ruleset(words, &rules) {
            Ok(words) => {
                for word in &words {
                    println!("{}", word.render(&graphs));
                }
            }
            Err(e) => {
                eprintln!("Error applying ruleset: {e}");
                process::exit(EXIT_PARSE);
            }
        }
    }
}
