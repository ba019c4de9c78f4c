//! Interactive text menu over a [`ProductionStore`].
//!
//! Input and output are generic so the loop can be driven from stdin/stdout
//! or from in-memory buffers.

use std::io::{BufRead, Write};

use tracing::{debug, warn};

use crate::error::MenuError;
use crate::model::{Availability, OrderStatus, ProductionOrder};
use crate::sqlite::ProductionStore;

/// Entries of the main menu, numbered 1 to 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    RegisterProduct,
    ListProducts,
    RegisterOrder,
    ListOrders,
    CheckAvailability,
    UpdateOrderStatus,
    ProductionReport,
    Exit,
}

impl MenuOption {
    pub const ALL: [MenuOption; 8] = [
        MenuOption::RegisterProduct,
        MenuOption::ListProducts,
        MenuOption::RegisterOrder,
        MenuOption::ListOrders,
        MenuOption::CheckAvailability,
        MenuOption::UpdateOrderStatus,
        MenuOption::ProductionReport,
        MenuOption::Exit,
    ];

    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(MenuOption::RegisterProduct),
            "2" => Some(MenuOption::ListProducts),
            "3" => Some(MenuOption::RegisterOrder),
            "4" => Some(MenuOption::ListOrders),
            "5" => Some(MenuOption::CheckAvailability),
            "6" => Some(MenuOption::UpdateOrderStatus),
            "7" => Some(MenuOption::ProductionReport),
            "8" => Some(MenuOption::Exit),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuOption::RegisterProduct => "Register Product",
            MenuOption::ListProducts => "List Products",
            MenuOption::RegisterOrder => "Register Production Order",
            MenuOption::ListOrders => "List Production Orders",
            MenuOption::CheckAvailability => "Check Material Availability",
            MenuOption::UpdateOrderStatus => "Update Production Order Status",
            MenuOption::ProductionReport => "Production Report",
            MenuOption::Exit => "Exit",
        }
    }
}

enum Flow {
    Continue,
    Exit,
}

pub struct Menu<'a, R, W> {
    store: &'a ProductionStore,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(store: &'a ProductionStore, input: R, output: W) -> Self {
        Self {
            store,
            input,
            output,
        }
    }

    /// Run until the user picks Exit or input ends.
    pub fn run(&mut self) -> Result<(), MenuError> {
        loop {
            self.print_menu()?;
            let Some(choice) = self.prompt("Choose an option: ")? else {
                break;
            };
            let flow = match MenuOption::from_choice(&choice) {
                Some(option) => {
                    debug!(?option, "menu option selected");
                    self.dispatch(option)?
                }
                None => {
                    writeln!(self.output, "Invalid option. Try again.")?;
                    Flow::Continue
                }
            };
            if let Flow::Exit = flow {
                break;
            }
        }
        self.output.flush()?;
        Ok(())
    }

    /// Hand back the output sink, e.g. to inspect what was printed.
    pub fn into_output(self) -> W {
        self.output
    }

    fn print_menu(&mut self) -> Result<(), MenuError> {
        writeln!(self.output, "\n### Menu ###")?;
        for (i, option) in MenuOption::ALL.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, option.label())?;
        }
        Ok(())
    }

    fn dispatch(&mut self, option: MenuOption) -> Result<Flow, MenuError> {
        match option {
            MenuOption::RegisterProduct => self.register_product(),
            MenuOption::ListProducts => self.list_products(),
            MenuOption::RegisterOrder => self.register_order(),
            MenuOption::ListOrders => self.list_orders(),
            MenuOption::CheckAvailability => self.check_availability(),
            MenuOption::UpdateOrderStatus => self.update_order_status(),
            MenuOption::ProductionReport => self.production_report(),
            MenuOption::Exit => Ok(Flow::Exit),
        }
    }

    fn register_product(&mut self) -> Result<Flow, MenuError> {
        let Some(name) = self.prompt("Enter the product name: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(quantity) = self.prompt_number("Enter the initial material quantity: ")? else {
            return Ok(Flow::Exit);
        };
        self.store.add_product(&name, quantity)?;
        writeln!(self.output, "Product \"{name}\" registered successfully!")?;
        Ok(Flow::Continue)
    }

    fn list_products(&mut self) -> Result<Flow, MenuError> {
        let products = self.store.list_products()?;
        if products.is_empty() {
            writeln!(self.output, "No products registered.")?;
        } else {
            writeln!(self.output, "### Registered Products ###")?;
            for p in &products {
                writeln!(
                    self.output,
                    "ID: {}, Name: {}, Initial Quantity: {}",
                    p.id, p.name, p.initial_quantity
                )?;
            }
        }
        Ok(Flow::Continue)
    }

    fn register_order(&mut self) -> Result<Flow, MenuError> {
        let Some(product) = self.prompt("Enter the product name for the production order: ")?
        else {
            return Ok(Flow::Exit);
        };
        let Some(quantity) = self.prompt_number("Enter the desired quantity: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(delivery_date) = self.prompt("Enter the delivery date (YYYY-MM-DD): ")? else {
            return Ok(Flow::Exit);
        };
        self.store.add_order(&product, quantity, &delivery_date)?;
        writeln!(self.output, "Production order registered successfully!")?;
        Ok(Flow::Continue)
    }

    fn list_orders(&mut self) -> Result<Flow, MenuError> {
        let orders = self.store.list_orders()?;
        if orders.is_empty() {
            writeln!(self.output, "No production orders found.")?;
        }
        for o in &orders {
            writeln!(
                self.output,
                "ID: {}, Product: {}, Quantity: {}, Delivery Date: {}, Status: {}",
                o.id, o.product_name, o.quantity, o.delivery_date, o.status
            )?;
        }
        Ok(Flow::Continue)
    }

    fn check_availability(&mut self) -> Result<Flow, MenuError> {
        let Some(product) = self.prompt("Enter the product name to check availability: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(quantity) = self.prompt_number("Enter the desired quantity: ")? else {
            return Ok(Flow::Exit);
        };
        match self.store.check_availability(&product, quantity)? {
            Availability::Producible { .. } => {
                writeln!(self.output, "Production possible for product \"{product}\".")?
            }
            Availability::Insufficient { .. } => writeln!(
                self.output,
                "Production not possible for product \"{product}\" due to lack of materials."
            )?,
            Availability::NotFound => {
                writeln!(self.output, "Product \"{product}\" not found.")?
            }
        }
        Ok(Flow::Continue)
    }

    fn update_order_status(&mut self) -> Result<Flow, MenuError> {
        let Some(order_id) = self.prompt_number("Enter the ID of the production order to update: ")?
        else {
            return Ok(Flow::Exit);
        };
        let Some(raw_status) = self.prompt("Enter the new status (In progress/Completed): ")?
        else {
            return Ok(Flow::Exit);
        };
        let status: OrderStatus = match raw_status.parse() {
            Ok(status) => status,
            Err(_) => {
                writeln!(
                    self.output,
                    "Invalid status \"{raw_status}\". Use \"In progress\" or \"Completed\"."
                )?;
                return Ok(Flow::Continue);
            }
        };
        self.store.update_order_status(order_id, status)?;
        writeln!(self.output, "Production order status updated successfully!")?;
        Ok(Flow::Continue)
    }

    fn production_report(&mut self) -> Result<Flow, MenuError> {
        let report = self.store.production_report()?;
        writeln!(self.output, "### Orders In Progress ###")?;
        self.write_report_lines(&report.in_progress)?;
        writeln!(self.output, "\n### Completed Orders ###")?;
        self.write_report_lines(&report.completed)?;
        Ok(Flow::Continue)
    }

    fn write_report_lines(&mut self, orders: &[ProductionOrder]) -> Result<(), MenuError> {
        for o in orders {
            writeln!(
                self.output,
                "ID: {}, Product: {}, Quantity: {}, Delivery Date: {}",
                o.id, o.product_name, o.quantity, o.delivery_date
            )?;
        }
        Ok(())
    }

    /// Print `message` and read one line. `None` means end of input.
    fn prompt(&mut self, message: &str) -> Result<Option<String>, MenuError> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn prompt_number(&mut self, message: &str) -> Result<Option<i64>, MenuError> {
        let Some(raw) = self.prompt(message)? else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        trimmed
            .parse()
            .map(Some)
            .map_err(|source| MenuError::InvalidNumber {
                input: trimmed.to_string(),
                source,
            })
    }
}

/// Run the menu over `store` and then close it.
///
/// A menu failure wins over a close failure; the latter is only logged.
pub fn run_session<R: BufRead, W: Write>(
    store: ProductionStore,
    input: R,
    output: W,
) -> Result<(), MenuError> {
    let result = Menu::new(&store, input, output).run();
    match result {
        Ok(()) => store.close().map_err(MenuError::from),
        Err(err) => {
            if let Err(close_err) = store.close() {
                warn!(error = %close_err, "failed to close database after menu error");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_script(store: &ProductionStore, script: &str) -> (Result<(), MenuError>, String) {
        let mut menu = Menu::new(store, script.as_bytes(), Vec::new());
        let result = menu.run();
        let output = String::from_utf8(menu.into_output()).unwrap();
        (result, output)
    }

    #[test]
    fn choices_map_to_options() {
        for (i, option) in MenuOption::ALL.iter().enumerate() {
            assert_eq!(MenuOption::from_choice(&(i + 1).to_string()), Some(*option));
        }
        assert_eq!(MenuOption::from_choice(" 8 \n"), Some(MenuOption::Exit));
        assert_eq!(MenuOption::from_choice("9"), None);
        assert_eq!(MenuOption::from_choice(""), None);
    }

    #[test]
    fn invalid_option_reprompts() {
        let store = ProductionStore::open_in_memory().unwrap();
        let (result, output) = run_script(&store, "42\n8\n");
        assert!(result.is_ok());
        assert!(output.contains("Invalid option. Try again."));
        assert_eq!(output.matches("### Menu ###").count(), 2);
    }

    #[test]
    fn empty_listings_say_so() {
        let store = ProductionStore::open_in_memory().unwrap();
        let (_, output) = run_script(&store, "2\n4\n8\n");
        assert!(output.contains("No products registered."));
        assert!(output.contains("No production orders found."));
    }

    #[test]
    fn non_numeric_quantity_ends_the_loop_with_error() {
        let store = ProductionStore::open_in_memory().unwrap();
        let (result, _) = run_script(&store, "1\nChair\nlots\n8\n");
        match result {
            Err(MenuError::InvalidNumber { input, .. }) => assert_eq!(input, "lots"),
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
        assert!(store.list_products().unwrap().is_empty());
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let store = ProductionStore::open_in_memory().unwrap();
        let (result, _) = run_script(&store, "1\nChair\n");
        assert!(result.is_ok());
        assert!(store.list_products().unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_status() {
        let store = ProductionStore::open_in_memory().unwrap();
        let order = store.add_order("Chair", 1, "2024-01-01").unwrap();
        let (result, output) = run_script(&store, "6\n1\nDone-ish\n8\n");
        assert!(result.is_ok());
        assert!(output.contains("Invalid status \"Done-ish\""));
        assert_eq!(
            store.get_order(order.id).unwrap().unwrap().status,
            OrderStatus::InProgress
        );
    }

    #[test]
    fn session_reports_menu_error_after_closing() {
        let store = ProductionStore::open_in_memory().unwrap();
        let mut output = Vec::new();
        let result = run_session(store, "3\nChair\nten\n".as_bytes(), &mut output);
        match result {
            Err(MenuError::InvalidNumber { input, .. }) => assert_eq!(input, "ten"),
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn session_closes_store_on_exit() {
        let store = ProductionStore::open_in_memory().unwrap();
        let mut output = Vec::new();
        run_session(store, "8\n".as_bytes(), &mut output).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("8. Exit"));
    }
}
