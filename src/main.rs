use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vestigium::commands::porcelain::init;
use vestigium::{ObjectType, Repository};

#[derive(Parser)]
#[command(
    name = "ves",
    version = "0.1.0",
    about = "A Git-compatible local version-control engine",
    long_about = "Vestigium is a small version-control engine whose on-disk \
    formats (objects, refs, index) are bit-exact compatible with Git, so \
    repositories it creates can be inspected with stock Git tooling.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "init", about = "Initialize a new repository")]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<String>,
    },
    #[command(name = "cat-file", about = "Print the content of an object")]
    CatFile {
        #[arg(index = 1, help = "The object name to print")]
        object: String,
        #[arg(short = 't', long = "type", help = "Expected object type")]
        object_type: Option<String>,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file and optionally write it to the object store"
    )]
    HashObject {
        #[arg(short, long, help = "Write the object to the object store")]
        write: bool,
        #[arg(short = 't', long = "type", default_value = "blob", help = "Object type")]
        object_type: String,
        #[arg(index = 1)]
        file: String,
    },
    #[command(name = "add", about = "Add files or directories to the index")]
    Add {
        #[arg(index = 1, required = true, help = "The files or directories to stage")]
        paths: Vec<String>,
    },
    #[command(name = "rm", about = "Remove files from the index")]
    Rm {
        #[arg(index = 1, required = true, help = "The files to remove")]
        paths: Vec<String>,
        #[arg(long, help = "Only remove from the index, keep the file")]
        cached: bool,
    },
    #[command(name = "commit", about = "Create a new commit from the index")]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(name = "status", about = "Show the working tree status")]
    Status {
        #[arg(long, help = "Machine-readable output")]
        porcelain: bool,
    },
    #[command(name = "ls-files", about = "List staged files")]
    LsFiles {
        #[arg(long, help = "Show stat detail for every entry")]
        verbose: bool,
    },
    #[command(name = "ls-tree", about = "List the contents of a tree object")]
    LsTree {
        #[arg(index = 1, help = "The tree-ish to list")]
        tree: String,
        #[arg(short, long, help = "Recurse into subtrees")]
        recursive: bool,
    },
    #[command(name = "check-ignore", about = "Check paths against the ignore rules")]
    CheckIgnore {
        #[arg(index = 1, required = true, help = "Paths to check")]
        paths: Vec<String>,
    },
    #[command(name = "show-ref", about = "List references")]
    ShowRef,
    #[command(name = "tag", about = "Create or list tags")]
    Tag {
        #[arg(index = 1, help = "The tag name; lists tags when omitted")]
        name: Option<String>,
        #[arg(index = 2, default_value = "HEAD", help = "The object the tag points at")]
        object: String,
        #[arg(short = 'a', long, help = "Create an annotated tag object")]
        annotate: bool,
        #[arg(short, long, help = "The tag message (annotated tags)")]
        message: Option<String>,
    },
    #[command(name = "rev-parse", about = "Resolve a name to a full object id")]
    RevParse {
        #[arg(index = 1, help = "The name to resolve")]
        name: String,
        #[arg(short = 't', long = "type", help = "Follow to this object type")]
        object_type: Option<String>,
    },
    #[command(name = "checkout", about = "Materialize a commit or tree into a directory")]
    Checkout {
        #[arg(index = 1, help = "The commit or tree to check out")]
        object: String,
        #[arg(index = 2, help = "The destination directory (must be empty)")]
        path: PathBuf,
    },
}

fn parse_object_type(name: &str) -> Result<ObjectType> {
    ObjectType::try_from(name)
}

fn open_repository() -> Result<Repository> {
    let pwd = std::env::current_dir()?;
    Repository::find(&pwd, Box::new(std::io::stdout()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { path } => {
            let path = match path {
                Some(path) => PathBuf::from(path),
                None => std::env::current_dir()?,
            };
            init::init(&path, Box::new(std::io::stdout()))?
        }
        Commands::CatFile {
            object,
            object_type,
        } => {
            let expected = object_type
                .as_deref()
                .map(parse_object_type)
                .transpose()?;
            open_repository()?.cat_file(object, expected)?
        }
        Commands::HashObject {
            write,
            object_type,
            file,
        } => {
            let object_type = parse_object_type(object_type)?;
            open_repository()?.hash_object(std::path::Path::new(file), object_type, *write)?
        }
        Commands::Add { paths } => open_repository()?.add(paths)?,
        Commands::Rm { paths, cached } => open_repository()?.rm(paths, *cached)?,
        Commands::Commit { message } => open_repository()?.commit(message)?,
        Commands::Status { porcelain } => open_repository()?.status(*porcelain)?,
        Commands::LsFiles { verbose } => open_repository()?.ls_files(*verbose)?,
        Commands::LsTree { tree, recursive } => open_repository()?.ls_tree(tree, *recursive)?,
        Commands::CheckIgnore { paths } => open_repository()?.check_ignore(paths)?,
        Commands::ShowRef => open_repository()?.show_ref()?,
        Commands::Tag {
            name,
            object,
            annotate,
            message,
        } => open_repository()?.tag(name.as_deref(), object, *annotate, message.as_deref())?,
        Commands::RevParse { name, object_type } => {
            let expected = object_type
                .as_deref()
                .map(parse_object_type)
                .transpose()?;
            open_repository()?.rev_parse(name, expected)?
        }
        Commands::Checkout { object, path } => open_repository()?.checkout(object, path)?,
    }

    Ok(())
}
