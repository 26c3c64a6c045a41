use std::collections::HashMap;

use serde_json::Value;

use crate::models::Row;

/// Column carrying the order identity in order detail rows.
pub const ORDER_KEY: &str = "amazonOrderId";

/// Columns that describe a single order line rather than the order.
pub const PRODUCT_FIELDS: [&str; 12] = [
    "orderItemId",
    "sku",
    "productName",
    "quantityPurchased",
    "itemPrice",
    "itemTax",
    "shippingPrice",
    "shippingTax",
    "vatExclusiveItemPrice",
    "vatExclusiveShippingPrice",
    "asin",
    "referenciaProv",
];

/// Fold one-row-per-item detail rows into orders carrying an `items` array.
///
/// Orders keep the position of their first row. Order-level columns are taken
/// from that first row; later rows of the same order only contribute an item.
pub fn group_orders_with_items(rows: Vec<Row>) -> Vec<Row> {
    let mut orders: Vec<Row> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for mut row in rows {
        let key = row.get(ORDER_KEY).map(order_key).unwrap_or_default();

        let mut item = Row::new();
        for field in PRODUCT_FIELDS {
            if let Some(value) = row.remove(field) {
                item.insert(field.to_string(), value);
            }
        }

        match positions.get(&key) {
            Some(&index) => {
                if let Some(Value::Array(items)) = orders[index].get_mut("items") {
                    items.push(Value::Object(item));
                }
            }
            None => {
                row.insert("items".to_string(), Value::Array(vec![Value::Object(item)]));
                positions.insert(key, orders.len());
                orders.push(row);
            }
        }
    }

    orders
}

fn order_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_groups_items_under_their_order() {
        let rows = vec![
            row(json!({"amazonOrderId": "A", "orderStatus": "Unshipped", "sku": "S1", "itemPrice": 10.5})),
            row(json!({"amazonOrderId": "B", "orderStatus": "Unshipped", "sku": "S2", "itemPrice": 3.0})),
            row(json!({"amazonOrderId": "A", "orderStatus": "Unshipped", "sku": "S3", "itemPrice": 1.0})),
        ];

        let orders = group_orders_with_items(rows);

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0]["amazonOrderId"], "A");
        assert_eq!(orders[1]["amazonOrderId"], "B");

        let items = orders[0]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["sku"], "S1");
        assert_eq!(items[1]["sku"], "S3");
    }

    #[test]
    fn test_product_fields_leave_the_order_level() {
        let rows = vec![row(json!({
            "amazonOrderId": "A",
            "orderTotal": 12.0,
            "sku": "S1",
            "asin": "B000",
            "quantityPurchased": 2
        }))];

        let orders = group_orders_with_items(rows);
        let order = &orders[0];

        assert!(order.get("sku").is_none());
        assert!(order.get("asin").is_none());
        assert_eq!(order["orderTotal"], 12.0);
        assert_eq!(order["items"][0]["quantityPurchased"], 2);
        // absent product columns are not invented
        assert!(order["items"][0].get("referenciaProv").is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(group_orders_with_items(Vec::new()).is_empty());
    }
}
