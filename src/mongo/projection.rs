use mongodb::bson::Document;

/// Fields to return from a find.
///
/// A list of field names includes each of them; a document is used as the
/// projection as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Fields(Vec<String>),
    Document(Document),
}

impl Projection {
    #[must_use]
    pub fn into_document(self) -> Document {
        match self {
            Projection::Fields(fields) => {
                let mut projection = Document::new();
                for field in fields {
                    projection.insert(field, 1);
                }
                projection
            }
            Projection::Document(document) => document,
        }
    }
}

impl From<Document> for Projection {
    fn from(document: Document) -> Self {
        Projection::Document(document)
    }
}

impl From<Vec<String>> for Projection {
    fn from(fields: Vec<String>) -> Self {
        Projection::Fields(fields)
    }
}

impl From<&[&str]> for Projection {
    fn from(fields: &[&str]) -> Self {
        Projection::Fields(fields.iter().map(|f| (*f).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Projection {
    fn from(fields: [&str; N]) -> Self {
        Projection::Fields(fields.iter().map(|f| (*f).to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn field_list_becomes_inclusion_document() {
        let projection = Projection::from(["name", "address.city"]).into_document();
        assert_eq!(projection, doc! { "name": 1, "address.city": 1 });
    }

    #[test]
    fn document_passes_through() {
        let projection = Projection::from(doc! { "_id": 0, "name": 1 }).into_document();
        assert_eq!(projection, doc! { "_id": 0, "name": 1 });
    }
}
