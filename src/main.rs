use aardict::Dictionary;
use clap::Parser;
use color_eyre::config::HookBuilder;
use color_eyre::eyre::{Report, WrapErr};

/// look up words in aar and sdct dictionary files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = false)]
    /// print the article text for each match, default is only the words
    articles: bool,

    /// maximum number of matches to print
    #[arg(short, long, default_value_t = 50)]
    limit: usize,

    /// the dictionary file to open
    dictionary_file: String,

    /// word or prefix to look up; without it, only metadata is printed
    query: Option<String>,
}

fn main() -> Result<(), Report> {
    HookBuilder::default().display_env_section(false).install()?;
    env_logger::init();
    let args = Args::parse();
    let dictionary = Dictionary::open(&args.dictionary_file)
        .wrap_err_with(|| format!("Error opening dictionary {}", args.dictionary_file))?;
    println!(
        "{}: '{}' version {}, {} words, index language '{}'",
        dictionary.file_name(),
        dictionary.title(),
        dictionary.version(),
        dictionary.word_count(),
        dictionary.index_language()
    );
    let Some(query) = args.query else {
        return Ok(());
    };
    for item in dictionary
        .prefix_lookup(&query)
        .wrap_err_with(|| format!("Error searching for '{query}'"))?
        .take(args.limit)
    {
        let (word, handle) = item.wrap_err("Error walking the word index")?;
        match args.articles {
            true => {
                let article = handle.read().wrap_err_with(|| format!("Error reading the article for '{word}'"))?;
                println!("{word}\n{}", article.text);
            }
            false => println!("{word}"),
        }
    }
    Ok(())
}
