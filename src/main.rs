use clap::{Parser, Subcommand};
use simple_wiki::cancel::CancelToken;
use simple_wiki::export::ExportFormat;
use simple_wiki::filter::{FilterOptions, TagMode, filter_pages};
use simple_wiki::section::LinkType;
use simple_wiki::slug::slugify;
use simple_wiki::types::{Page, Status};
use simple_wiki::wiki::{ExportScope, Wiki};
use simple_wiki::{config, output};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Which part of the wiki a manifest or export covers.
#[derive(clap::Args, Clone, Default)]
struct ScopeArgs {
    /// Export a single page by slug
    #[arg(long, conflicts_with = "section")]
    page: Option<String>,

    /// Export one section (slug or unique title; "" for the root section)
    #[arg(long)]
    section: Option<String>,

    /// With --section, also export the sections it links to
    #[arg(long, requires = "section")]
    with_links: bool,

    /// Link types to follow with --with-links (default: from wiki.toml)
    #[arg(long = "link-type", requires = "with_links")]
    link_types: Vec<LinkType>,
}

impl ScopeArgs {
    fn scope(&self) -> ExportScope {
        if let Some(slug) = &self.page {
            ExportScope::Page(slug.clone())
        } else if let Some(key) = &self.section {
            ExportScope::Section {
                key: key.clone(),
                with_links: self.with_links,
                link_types: self.link_types.clone(),
            }
        } else {
            ExportScope::All
        }
    }
}

/// Page filters shared by manifest, export and list.
#[derive(clap::Args, Clone, Default)]
struct FilterArgs {
    /// Keep pages whose title contains this text
    #[arg(long)]
    title: Option<String>,

    /// Keep pages carrying this tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// How several --tag values combine: any or all
    #[arg(long, default_value = "any")]
    tag_mode: TagMode,

    /// Keep pages in this section (label or slug segment)
    #[arg(long)]
    filter_section: Option<String>,

    /// Keep pages containing every word of this query
    #[arg(long)]
    query: Option<String>,

    /// Case-insensitive title and looser section matching
    #[arg(long)]
    ignore_case: bool,
}

impl FilterArgs {
    fn options(&self) -> FilterOptions {
        FilterOptions {
            title: self.title.clone().unwrap_or_default(),
            section: self.filter_section.clone().unwrap_or_default(),
            tags: self.tags.clone(),
            tag_mode: self.tag_mode,
            query: self.query.clone().unwrap_or_default(),
            ignore_case: self.ignore_case,
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-wiki")]
#[command(about = "Markdown knowledge base with a section index and export manifests")]
#[command(long_about = "\
Markdown knowledge base with a section index and export manifests

Every page is a Markdown file with YAML frontmatter. Its slug decides its
section: the part before the first '/'.

Wiki structure:

  wiki/
  ├── wiki.toml                # Config (optional)
  ├── index.yaml               # Section index (optional; generated if absent)
  ├── home.md                  # slug: home          → root section
  ├── guide/
  │   └── intro.md             # slug: guide/intro   → section \"guide\"
  └── templates/               # Skipped unless include_templates = true

Page frontmatter:

  ---
  title: Intro
  slug: guide/intro
  section: Guide               # Section label (names generated sections)
  order: 1                     # Non-zero orders sort first
  tags: [rust, setup]
  status: published            # draft | published | archived
  ---

Run 'simple-wiki gen-config' to generate a documented wiki.toml.")]
#[command(version)]
struct Cli {
    /// Wiki root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the section index (persisted or generated)
    Index {
        /// Generate an index from the pages and write it to the index file
        #[arg(long)]
        write: bool,
        /// Overwrite an existing index file
        #[arg(long, requires = "write")]
        force: bool,
    },
    /// Print the ordered page list an export would render
    Manifest {
        #[command(flatten)]
        scope: ScopeArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// Render pages into one Markdown or HTML document
    Export {
        #[command(flatten)]
        scope: ScopeArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output format (default: from wiki.toml)
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Document title (default: from wiki.toml)
        #[arg(long)]
        doc_title: Option<String>,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List pages, optionally filtered
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Full-text search over titles, tags and bodies
    Search {
        query: String,
    },
    /// Create a new page file
    New {
        title: String,
        /// Page slug (default: derived from section and title)
        #[arg(long)]
        slug: Option<String>,
        /// Section label
        #[arg(long)]
        section: Option<String>,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, default_value = "draft")]
        status: Status,
    },
    /// Validate pages, index and section links without exporting
    Check,
    /// Print a stock wiki.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let wiki = Wiki::open(&cli.root)?;
    let cancel = CancelToken::new();

    match cli.command {
        Command::Index { write, force } => {
            let pages = wiki.pages(&cancel)?;
            if write {
                let path = wiki.write_index(&pages, force, &cancel)?;
                println!("==> Wrote {}", path.display());
            }
            let source = wiki.index_source(&pages, &cancel)?;
            output::print_index_tree(source.index(), source.is_generated(), &pages);
        }
        Command::Manifest {
            scope,
            filter,
            json,
        } => {
            let set = wiki.export_set(&scope.scope(), &filter.options(), &cancel)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&set.entries)?);
            } else {
                output::print_manifest(&set.entries);
            }
        }
        Command::Export {
            scope,
            filter,
            format,
            doc_title,
            output: out_path,
        } => {
            let format = format.unwrap_or(wiki.config().export.format);
            let document = wiki.export(
                &scope.scope(),
                &filter.options(),
                format,
                doc_title.as_deref(),
                &cancel,
            )?;
            match out_path {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, document)?;
                    println!("==> Exported {} → {}", format, path.display());
                }
                None => print!("{document}"),
            }
        }
        Command::List { filter } => {
            let mut pages = filter_pages(wiki.pages(&cancel)?, &filter.options());
            pages.sort_by(|a, b| a.slug.cmp(&b.slug));
            output::print_pages(&pages, wiki.root());
        }
        Command::Search { query } => {
            let opts = FilterOptions {
                query: query.clone(),
                ..FilterOptions::default()
            };
            let mut pages = filter_pages(wiki.pages(&cancel)?, &opts);
            pages.sort_by(|a, b| a.slug.cmp(&b.slug));
            output::print_search_results(&pages, &query);
        }
        Command::New {
            title,
            slug,
            section,
            tags,
            status,
        } => {
            let slug = slug.unwrap_or_else(|| default_slug(&title, section.as_deref()));
            let mut page = Page::new(title.trim(), slug);
            page.section = section.unwrap_or_default();
            page.set_tags(&tags);
            page.status = status;
            page.content = format!("# {}\n", title.trim());
            let path = wiki.create_page(&page)?;
            println!("==> Created {}", path.display());
        }
        Command::Check => {
            println!("==> Checking {}", wiki.root().display());
            let report = wiki.check(&cancel)?;
            output::print_check(&report);
            if !report.is_ok() {
                return Err(format!("check failed with {} problem(s)", report.problems.len()).into());
            }
        }
        // Printed before the wiki is opened.
        Command::GenConfig => {}
    }

    Ok(())
}

/// `section-key/title-slug`, or just the title slug without a section.
fn default_slug(title: &str, section: Option<&str>) -> String {
    let page = slugify(title);
    match section.map(slugify).filter(|s| !s.is_empty()) {
        Some(section) => format!("{section}/{page}"),
        None => page,
    }
}

/// Diagnostic logging to stderr; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
