use taskpilot_core::template::TemplateLibrary;

use super::cli::{TemplateAction, TemplateArgs};
use super::{load_library, parse_vars};
use crate::error::CliError;

pub fn template(args: TemplateArgs) -> Result<i32, CliError> {
    let lib = load_library(args.library.as_deref())?;
    match args.action {
        TemplateAction::List => print!("{}", list(&lib)),
        TemplateAction::Show { name } => {
            let t = lib.get(&name)?;
            println!("{} (v{})", t.name, t.version);
            if let Some(category) = &t.category {
                println!("category:  {}", category);
            }
            let vars: Vec<String> = t.variables().into_iter().collect();
            println!("variables: {}", vars.join(", "));
            println!("content:   {}", t.content);
        }
        TemplateAction::Render { name, vars } => {
            println!("{}", lib.render(&name, &parse_vars(&vars)?)?);
        }
        TemplateAction::Compose { names, vars } => {
            println!("{}", lib.compose(&names, &parse_vars(&vars)?)?);
        }
        TemplateAction::Export { out } => {
            let json = lib.export_json()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    eprintln!("📁 Library written to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }
    Ok(0)
}

fn list(lib: &TemplateLibrary) -> String {
    let mut out = String::new();
    for t in lib.templates() {
        let category = t.category.as_deref().unwrap_or("-");
        out.push_str(&format!("{:<20} v{:<3} {:<16} {}\n", t.name, t.version, category, t.content));
    }
    out
}
