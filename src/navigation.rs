//! The navigation bar shared by the grid and summary pages.

use maud::{Markup, html};

use crate::endpoints;

/// A link in the navigation bar, highlighted when `is_current` is set.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-blue-700 rounded-sm lg:p-0 dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                (self.title)
            }
        )
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
}

impl NavBar<'_> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as active and displayed differently in the HTML.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        let links = [
            (endpoints::TRANSACTIONS_VIEW, "Transactions"),
            (endpoints::SUMMARY_VIEW, "Summary"),
        ]
        .into_iter()
        .map(|(url, title)| Link {
            url,
            title,
            is_current: active_endpoint == url,
        })
        .collect();

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                    {
                        "Ledgergrid"
                    }

                    ul
                        class="font-medium flex flex-row space-x-8 rtl:space-x-reverse"
                    {
                        @for link in self.links {
                            li { (link.into_html()) }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use crate::{endpoints, navigation::NavBar};

    #[test]
    fn set_active_endpoint() {
        let cases = [
            (endpoints::TRANSACTIONS_VIEW, true),
            (endpoints::SUMMARY_VIEW, true),
            (endpoints::ROOT, false),
            (endpoints::GRID_ROWS, false),
            (endpoints::SUMMARY_API, false),
        ];

        for (endpoint, should_be_active) in cases {
            let nav_bar = NavBar::new(endpoint);

            assert_link_active(nav_bar, endpoint, should_be_active);
        }
    }

    #[track_caller]
    fn assert_link_active(nav_bar: NavBar<'_>, endpoint: &str, should_be_active: bool) {
        for link in nav_bar.links {
            if link.url == endpoint {
                assert_eq!(
                    link.is_current, should_be_active,
                    "link for {endpoint} should have is_current={should_be_active}"
                );
            } else {
                assert!(!link.is_current, "link for {} should be inactive", link.url);
            }
        }
    }
}
