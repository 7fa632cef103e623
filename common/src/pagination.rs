//! Abstractions for page-number pagination.

/// Page of items selected by page-number [`Arguments`].
#[derive(Clone, Debug)]
pub struct Page<I> {
    /// Items on this [`Page`].
    pub items: Vec<I>,

    /// 1-based number of this [`Page`].
    pub number: usize,

    /// Maximum number of items per [`Page`].
    pub size: usize,

    /// Total number of items across all [`Page`]s.
    pub total: usize,
}

impl<I> Page<I> {
    /// Creates a new [`Page`] of the provided `items`.
    #[must_use]
    pub fn new(
        args: Arguments,
        items: impl IntoIterator<Item = impl Into<I>>,
        total: usize,
    ) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            number: args.number,
            size: args.size,
            total,
        }
    }

    /// Returns the total number of [`Page`]s.
    ///
    /// Always at least `1`, so the first page exists even if there are no
    /// items at all.
    #[must_use]
    pub fn num_pages(&self) -> usize {
        self.total.div_ceil(self.size.max(1)).max(1)
    }

    /// Indicates whether this [`Page`] is within the existing [`Page`]s.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.number <= self.num_pages()
    }

    /// Indicates whether there is a [`Page`] after this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages()
    }

    /// Indicates whether there is a [`Page`] before this one.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Maps items of this [`Page`] with the provided function.
    #[must_use]
    pub fn map<T>(self, f: impl FnMut(I) -> T) -> Page<T> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total: self.total,
        }
    }
}

/// Page-number pagination arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arguments {
    /// 1-based number of the requested page.
    pub number: usize,

    /// Size of the requested page.
    pub size: usize,
}

impl Arguments {
    /// Creates new [`Arguments`] for the provided page `number`.
    ///
    /// [`None`] is returned if the `number` is zero or not representable.
    pub fn new<Num>(number: Option<Num>, size: usize) -> Option<Self>
    where
        Num: TryInto<usize>,
    {
        let number = match number {
            Some(n) => n.try_into().ok().filter(|n| *n > 0)?,
            None => 1,
        };
        (size > 0).then_some(Self { number, size })
    }

    /// Returns the number of items to skip.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.number - 1).saturating_mul(self.size)
    }

    /// Returns the maximum number of items to select.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.size
    }
}

/// Pagination selector.
#[derive(Clone, Copy, Debug)]
pub struct Selector<F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments,

    /// Additional filter being applied to the result.
    pub filter: F,
}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($node:ty, $filter:ty) => {
        #[doc = "A [`Page`] of nodes."]
        pub type Page = $crate::pagination::Page<$node>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Page};

    #[test]
    fn arguments_default_to_first_page() {
        let args = Arguments::new(None::<u32>, 10).unwrap();

        assert_eq!(args.number, 1);
        assert_eq!(args.offset(), 0);
        assert_eq!(args.limit(), 10);
    }

    #[test]
    fn arguments_reject_zero_and_negative_pages() {
        assert!(Arguments::new(Some(0_i64), 10).is_none());
        assert!(Arguments::new(Some(-3_i64), 10).is_none());
        assert_eq!(Arguments::new(Some(3_i64), 10).unwrap().offset(), 20);
    }

    #[test]
    fn page_navigation() {
        let args = Arguments::new(Some(2_u32), 10).unwrap();
        let page = Page::<u8>::new(args, [1_u8, 2, 3], 23);

        assert_eq!(page.num_pages(), 3);
        assert!(page.exists());
        assert!(page.has_next());
        assert!(page.has_previous());

        let empty = Page::<u8>::new(
            Arguments::new(None::<u32>, 10).unwrap(),
            Vec::<u8>::new(),
            0,
        );
        assert!(empty.exists());
        assert!(!empty.has_next());
        assert!(!empty.has_previous());

        let beyond = Page::<u8>::new(
            Arguments::new(Some(4_u32), 10).unwrap(),
            Vec::<u8>::new(),
            23,
        );
        assert!(!beyond.exists());
    }
}
