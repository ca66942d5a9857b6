use thiserror::Error;

/// An internal failure while writing the document.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("I/O error while writing XML: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML writer error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("closed <{found}> while <{expected}> was open")]
    MismatchedClose { expected: String, found: String },

    #[error("closed <{0}> with no element open")]
    NothingOpen(String),

    #[error("document finished with unclosed elements: {0:?}")]
    Unclosed(Vec<String>),

    #[error("{location} contains {character:?}, which XML 1.0 cannot represent")]
    IllegalCharacter { location: String, character: char },
}

/// Why a document failed the structural gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("document is empty")]
    Empty,

    #[error("document does not start with an XML declaration")]
    MissingDeclaration,

    #[error("document does not end with </jmeterTestPlan>")]
    MissingRootClose,

    #[error("unbalanced hashTree tags: {open} opened, {close} closed")]
    UnbalancedHashTree { open: usize, close: usize },

    #[error("document is not well-formed XML: {0}")]
    Malformed(String),

    #[error("found {0} XML declarations, expected one")]
    MultipleDeclarations(usize),

    #[error("root element is <{0}>, expected <jmeterTestPlan>")]
    WrongRoot(String),

    #[error("<jmeterTestPlan> has no version attribute")]
    MissingVersion,

    #[error("document has no TestPlan element")]
    MissingTestPlan,

    #[error("TestPlan.user_define_classpath must be an Arguments element with an Arguments.arguments collection")]
    MalformedClasspath,
}
