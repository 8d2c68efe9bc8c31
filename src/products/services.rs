use rust_decimal::Decimal;

use super::dto::{CreateProductRequest, UpdateProductRequest};
use super::repo_types::{
    Category, NewProduct, ProductFilter, ProductPatch, DEFAULT_IMAGE, MAX_PRICE, PRICE_SCALE,
};
use crate::error::{AppError, FieldError};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// `?category=` value: absent, empty or `all` means no filter.
pub fn category_filter(raw: Option<&str>) -> Result<ProductFilter, AppError> {
    let category = match raw.map(str::trim) {
        None | Some("") => None,
        Some(s) if s.eq_ignore_ascii_case("all") => None,
        Some(s) => Some(
            s.parse::<Category>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
        ),
    };
    Ok(ProductFilter { category, featured_only: false })
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    if name.is_empty() {
        errors.push(FieldError { field: "name", message: "Product name is required" });
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError { field: "name", message: "Product name cannot be more than 100 characters" });
    }
}

fn check_description(description: &str, errors: &mut Vec<FieldError>) {
    if description.trim().is_empty() {
        errors.push(FieldError { field: "description", message: "Product description is required" });
    } else if description.chars().count() > MAX_DESCRIPTION_LEN {
        errors.push(FieldError { field: "description", message: "Description cannot be more than 1000 characters" });
    }
}

fn check_price(price: Decimal, errors: &mut Vec<FieldError>) {
    if price < Decimal::ZERO {
        errors.push(FieldError { field: "price", message: "Price cannot be negative" });
    } else if price > MAX_PRICE {
        errors.push(FieldError { field: "price", message: "Price cannot be more than 9999999999.99" });
    } else if price.normalize().scale() > PRICE_SCALE {
        errors.push(FieldError { field: "price", message: "Price cannot have more than 2 decimal places" });
    }
}

fn check_stock(stock: i32, errors: &mut Vec<FieldError>) {
    if stock < 0 {
        errors.push(FieldError { field: "stock", message: "Stock cannot be negative" });
    }
}

fn parse_category(raw: &str, errors: &mut Vec<FieldError>) -> Option<Category> {
    match raw.parse::<Category>() {
        Ok(c) => Some(c),
        Err(_) => {
            errors.push(FieldError {
                field: "category",
                message: "Category is either: electronics, clothing, books, home, accessories, sports",
            });
            None
        }
    }
}

fn image_or_default(image: Option<String>) -> String {
    image
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_IMAGE.to_string())
}

pub fn validate_new(req: CreateProductRequest) -> Result<NewProduct, Vec<FieldError>> {
    let mut errors = Vec::new();
    let name = req.name.trim().to_string();
    check_name(&name, &mut errors);
    check_description(&req.description, &mut errors);

    let price = req.price.unwrap_or_else(|| {
        errors.push(FieldError { field: "price", message: "Product price is required" });
        Decimal::ZERO
    });
    check_price(price, &mut errors);

    let category = match req.category.as_deref() {
        Some(raw) => parse_category(raw, &mut errors),
        None => {
            errors.push(FieldError { field: "category", message: "Product category is required" });
            None
        }
    };

    let stock = req.stock.unwrap_or(0);
    check_stock(stock, &mut errors);

    match category {
        Some(category) if errors.is_empty() => Ok(NewProduct {
            name,
            description: req.description,
            price,
            category,
            image: image_or_default(req.image),
            stock,
            featured: req.featured.unwrap_or(false),
        }),
        _ => Err(errors),
    }
}

pub fn validate_patch(req: UpdateProductRequest) -> Result<ProductPatch, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = req.name.map(|n| n.trim().to_string());
    if let Some(n) = &name {
        check_name(n, &mut errors);
    }
    if let Some(d) = &req.description {
        check_description(d, &mut errors);
    }
    if let Some(p) = req.price {
        check_price(p, &mut errors);
    }
    if let Some(s) = req.stock {
        check_stock(s, &mut errors);
    }
    let category = req.category.as_deref().and_then(|c| parse_category(c, &mut errors));

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(ProductPatch {
        name,
        description: req.description,
        price: req.price,
        category,
        image: req.image.map(|i| image_or_default(Some(i))),
        stock: req.stock,
        featured: req.featured,
    })
}
