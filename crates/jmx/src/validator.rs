//! A structural gate for assembled documents. Checks run in a fixed order and
//! the first failure is returned; nothing is repaired.
use crate::error::ValidationError;

const DECLARATION: &str = "<?xml";
const ROOT: &str = "jmeterTestPlan";
const ROOT_CLOSE: &str = "</jmeterTestPlan>";

pub fn validate(document: &str) -> Result<(), ValidationError> {
    let content = document.trim();
    if content.is_empty() {
        return Err(ValidationError::Empty);
    }
    if !content.starts_with(DECLARATION) {
        return Err(ValidationError::MissingDeclaration);
    }
    if !content.ends_with(ROOT_CLOSE) {
        return Err(ValidationError::MissingRootClose);
    }

    let open = content.matches("<hashTree>").count();
    let close = content.matches("</hashTree>").count();
    if open != close {
        return Err(ValidationError::UnbalancedHashTree { open, close });
    }

    let doc = roxmltree::Document::parse(content)
        .map_err(|e| ValidationError::Malformed(e.to_string()))?;

    let declarations = content.matches(DECLARATION).count();
    if declarations != 1 {
        return Err(ValidationError::MultipleDeclarations(declarations));
    }

    let root = doc.root_element();
    if !root.has_tag_name(ROOT) {
        return Err(ValidationError::WrongRoot(root.tag_name().name().to_string()));
    }
    if root.attribute("version").is_none() {
        return Err(ValidationError::MissingVersion);
    }

    let test_plan = doc
        .descendants()
        .find(|n| n.has_tag_name("TestPlan"))
        .ok_or(ValidationError::MissingTestPlan)?;

    let classpath = test_plan.children().find(|n| {
        n.has_tag_name("elementProp") && n.attribute("name") == Some("TestPlan.user_define_classpath")
    });
    if let Some(classpath) = classpath {
        let has_collection = classpath.children().any(|n| {
            n.has_tag_name("collectionProp") && n.attribute("name") == Some("Arguments.arguments")
        });
        if classpath.attribute("elementType") != Some("Arguments") || !has_collection {
            return Err(ValidationError::MalformedClasspath);
        }
    }

    log::debug!("document passed validation ({} bytes)", document.len());
    Ok(())
}
