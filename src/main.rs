use dictweave::{Build, BuildConfig, Collation, DictionaryReader, Language};
use std::env;
use std::process;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <config.toml> [--no-compile]", program);
    eprintln!("       {} --lookup <dir> <basename> <language> <word>...", program);
    process::exit(1);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    if args[1] == "--lookup" {
        if args.len() < 6 {
            usage(&args[0]);
        }
        lookup(&args[2], &args[3], &args[4], &args[5..]);
        return;
    }

    let config = match BuildConfig::from_file(&args[1]) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    let skip_compile = args.iter().any(|arg| arg == "--no-compile");

    let build = Build::new(config);
    let compiler = if skip_compile { None } else { build.configured_compiler() };
    let compiler = compiler.as_ref().map(|c| c as &dyn dictweave::Compiler);

    match build.run(compiler) {
        Ok(summary) => {
            println!("{}", "=".repeat(60));
            println!("{}", summary);
            println!("{}", "=".repeat(60));
        }
        Err(e) => {
            eprintln!("\nERROR: {}", e);
            process::exit(1);
        }
    }
}

fn lookup(dir: &str, basename: &str, language: &str, words: &[String]) {
    let reader = match DictionaryReader::open_dir(dir, basename) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    let collation = Collation::for_language(&Language::resolve(language));

    for word in words {
        match reader.lookup(word, &collation) {
            Ok(Some(record)) => {
                println!("\n{} ({})", record.display_form, record.part_of_speech.label());
                if let Some(translit) = &record.transliteration {
                    println!("  [{}]", translit);
                }
                for (i, sense) in record.senses.iter().enumerate() {
                    println!("  {}. {}", i + 1, sense.gloss);
                    for example in &sense.examples {
                        match &example.translation {
                            Some(translation) => println!("       {} - {}", example.text, translation),
                            None => println!("       {}", example.text),
                        }
                    }
                }
            }
            Ok(None) => println!("\n{}: not found", word),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        }
    }
}
