use serde::Deserialize;
use till::catalog::NewProduct;

/// Product export from a spreadsheet or POS, either a bare list or `{ "products": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum ImportFile {
    List(Vec<NewProduct>),
    Wrapped { products: Vec<NewProduct> },
}

impl ImportFile {
    pub fn into_products(self) -> Vec<NewProduct> {
        match self {
            ImportFile::List(products) | ImportFile::Wrapped { products } => products,
        }
    }
}
